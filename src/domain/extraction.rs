//! Extractor collaborator seams.
//!
//! The pipeline is agnostic to how raw records are produced (site
//! selectors, rendering engine); one implementation of each trait exists
//! per marketplace, outside this crate.

use async_trait::async_trait;

use crate::domain::detail::DetailBundle;
use crate::domain::errors::ExtractionError;
use crate::domain::listing::ListingPage;

/// Supplies raw listing records for one marketplace, page by page.
#[async_trait]
pub trait ListingExtractor: Send + Sync {
    /// Fetch one result page for `query`. Pages are numbered from 1.
    async fn fetch_listing_page(
        &self,
        query: &str,
        page: u32,
    ) -> Result<ListingPage, ExtractionError>;
}

/// Supplies the detail bundle for a single product page.
#[async_trait]
pub trait DetailExtractor: Send + Sync {
    async fn fetch_detail_page(&self, link: &str) -> Result<DetailBundle, ExtractionError>;
}
