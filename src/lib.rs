//! Pricewatch - marketplace listing ingestion pipeline.
//!
//! Turns raw per-source listing records into durable, deduplicated
//! product identities, an append-only price history, and a replaceable
//! attribute set; a separate enrichment pass merges per-product detail.
//! Per-site extraction stays behind the [`domain::extraction`] traits.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod test_utils;

use anyhow::Result;

use application::{EnrichEngine, IngestEngine, RunReport};
use domain::extraction::{DetailExtractor, ListingExtractor};
use domain::platform::Platform;
use infrastructure::{AppConfig, DatabaseConnection, PgProductStore, init_logging, load_terms};

/// Run one listing-scan job for a platform: bootstrap logging, storage,
/// and the term list, then drive the ingest engine. Idempotent and
/// re-runnable; returns the aggregated report.
pub async fn run_ingest<X: ListingExtractor>(
    config: &AppConfig,
    platform: Platform,
    extractor: &X,
) -> Result<RunReport> {
    init_logging(&config.logging, platform.as_str())?;
    let db = DatabaseConnection::connect(&config.database).await?;
    db.ensure_schema().await?;
    let store = PgProductStore::new(db.pool().clone());
    let terms = load_terms(&config.ingest.terms_file).await?;
    let engine = IngestEngine::new(platform, &store, extractor, config.ingest_options());
    Ok(engine.run(&terms).await)
}

/// Run one detail-enrichment job for a platform.
pub async fn run_enrich<X: DetailExtractor>(
    config: &AppConfig,
    platform: Platform,
    extractor: &X,
) -> Result<RunReport> {
    init_logging(&config.logging, platform.as_str())?;
    let db = DatabaseConnection::connect(&config.database).await?;
    db.ensure_schema().await?;
    let store = PgProductStore::new(db.pool().clone());
    let engine = EnrichEngine::new(platform, &store, extractor, config.enrich_options());
    Ok(engine.run().await)
}
