//! Error taxonomy of the ingestion pipeline.
//!
//! Item- and page-level failures are recovered locally and folded into the
//! run report; only an unreachable fetch engine aborts a run.

use thiserror::Error;

use crate::domain::platform::Platform;

/// Failures raised by the extractor collaborators.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// A result page could not be fetched or rendered.
    #[error("page fetch failed: {message}")]
    PageFetch { message: String },

    /// A single listing card could not be parsed into a raw record.
    #[error("listing item could not be parsed: {message}")]
    ItemParse { message: String },

    /// A product detail page could not be fetched or parsed.
    #[error("detail fetch failed: {message}")]
    DetailFetch { message: String },

    /// The underlying fetch engine is gone; nothing further can succeed.
    #[error("fetch engine unreachable: {message}")]
    EngineUnreachable { message: String },
}

impl ExtractionError {
    /// Only an unreachable engine escalates; every other failure is local
    /// to its page or item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractionError::EngineUnreachable { .. })
    }
}

/// The listing carried no usable natural key; the item is skipped before
/// anything touches the store.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("{platform}: listing has no usable platform_product_id")]
    MissingNaturalKey { platform: Platform },
}

/// A store write that did not take effect. The enclosing transaction
/// rolled back, so no partial row for the item is visible.
#[derive(Debug, Clone, Error)]
#[error("persistence failed during {operation}: {message}")]
pub struct PersistenceError {
    pub operation: &'static str,
    pub message: String,
}

impl PersistenceError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Union of the recoverable per-item failure classes.
#[derive(Debug, Clone, Error)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
