//! Persistence contract of the pipeline.
//!
//! One trait covers the four storage concerns: the atomic identity
//! upsert, the append-only price log, the monotonic search-term counter,
//! and the wholesale detail/attribute replacement. Implementations return
//! typed records; callers never inspect raw driver rows.

use async_trait::async_trait;

use crate::domain::detail::DetailBundle;
use crate::domain::errors::PersistenceError;
use crate::domain::listing::{NewObservation, ProductCandidate};
use crate::domain::platform::Platform;

/// Outcome of the atomic identity upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductUpsert {
    /// The stable internal product id all child rows reference.
    pub id: i64,
    /// Whether this sighting created the product.
    pub is_new: bool,
}

/// A stored product awaiting its first successful detail pass.
#[derive(Debug, Clone)]
pub struct DetailTarget {
    pub product_id: i64,
    pub link: String,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert-or-update keyed on `(platform, platform_product_id)`, as a
    /// single atomic operation. An existing product gets its link, title,
    /// brand, and `updated_at` refreshed.
    async fn upsert_product(
        &self,
        candidate: &ProductCandidate,
    ) -> Result<ProductUpsert, PersistenceError>;

    /// Upsert the product and append one price observation, committed as
    /// one transaction. On failure nothing of the item is visible.
    async fn save_listing(
        &self,
        candidate: &ProductCandidate,
        observation: &NewObservation,
    ) -> Result<ProductUpsert, PersistenceError>;

    /// Add `new_products` to the `(term, platform)` counter and return the
    /// running total. Callers skip the call entirely when the increment
    /// would be zero.
    async fn bump_term_count(
        &self,
        term: &str,
        platform: Platform,
        new_products: u32,
    ) -> Result<i64, PersistenceError>;

    /// Overwrite the product's detail row with this pass's values and
    /// replace its attribute set (delete all, insert the new set), in one
    /// transaction.
    async fn replace_detail(
        &self,
        product_id: i64,
        bundle: &DetailBundle,
    ) -> Result<(), PersistenceError>;

    /// Products of `platform` that have a link but no detail row yet,
    /// newest sighting first.
    async fn products_missing_detail(
        &self,
        platform: Platform,
    ) -> Result<Vec<DetailTarget>, PersistenceError>;
}
