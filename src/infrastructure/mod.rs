//! Infrastructure layer - configuration, logging, storage, and the
//! search-term source.

pub mod config;
pub mod database_connection;
pub mod logging;
pub mod product_repository;
pub mod search_terms;

// Re-export commonly used items
pub use config::AppConfig;
pub use database_connection::DatabaseConnection;
pub use logging::init_logging;
pub use product_repository::PgProductStore;
pub use search_terms::load_terms;
