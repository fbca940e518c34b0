//! PostgreSQL connection pool and schema bootstrap.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::infrastructure::config::DatabaseConfig;

/// The pipeline-owned tables. `products` uniqueness on the natural key is
/// what makes the identity upsert atomic; everything else references the
/// resolved internal id.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS search_terms (
        id BIGSERIAL PRIMARY KEY,
        term TEXT NOT NULL,
        platform TEXT NOT NULL,
        count BIGINT NOT NULL DEFAULT 0,
        UNIQUE (term, platform)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        platform TEXT NOT NULL,
        platform_product_id TEXT NOT NULL,
        link TEXT,
        title TEXT,
        brand TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (platform, platform_product_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_price_logs (
        id BIGSERIAL PRIMARY KEY,
        product_id BIGINT NOT NULL REFERENCES products(id),
        price DOUBLE PRECISION NOT NULL,
        campaign_price DOUBLE PRECISION,
        stock_status TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_details (
        product_id BIGINT PRIMARY KEY REFERENCES products(id),
        description TEXT,
        store_name TEXT,
        store_rating DOUBLE PRECISION NOT NULL DEFAULT 0,
        shipping_info TEXT,
        free_shipping BOOLEAN NOT NULL DEFAULT FALSE,
        rating DOUBLE PRECISION NOT NULL DEFAULT 0,
        product_type TEXT,
        image_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_attributes (
        id BIGSERIAL PRIMARY KEY,
        product_id BIGINT NOT NULL REFERENCES products(id),
        attribute_name TEXT NOT NULL,
        attribute_value TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (product_id, attribute_name)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_price_logs_product_created
        ON product_price_logs (product_id, created_at)
    "#,
];

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .context("failed to connect to PostgreSQL")?;
        info!(max_connections = config.max_connections, "database pool ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the pipeline tables when absent. Idempotent; safe to run on
    /// every start.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("schema bootstrap statement failed")?;
        }
        info!("schema ensured");
        Ok(())
    }
}
