//! Shared test fixtures: an in-memory store and scripted extractors.
//!
//! The memory store mirrors the transactional semantics of the SQL
//! implementation — an injected failure writes nothing — so the engines
//! can be exercised end-to-end without a database.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::detail::DetailBundle;
use crate::domain::errors::{ExtractionError, PersistenceError};
use crate::domain::extraction::{DetailExtractor, ListingExtractor};
use crate::domain::listing::{ListingPage, NewObservation, ProductCandidate, RawListing};
use crate::domain::platform::Platform;
use crate::domain::store::{DetailTarget, ProductStore, ProductUpsert};

/// A product row as the memory store holds it.
#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub id: i64,
    pub platform: Platform,
    pub platform_product_id: String,
    pub link: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
}

/// A price observation row.
#[derive(Debug, Clone)]
pub struct StoredObservation {
    pub product_id: i64,
    pub price: f64,
    pub campaign_price: Option<f64>,
    pub stock_status: Option<String>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    products: Vec<StoredProduct>,
    observations: Vec<StoredObservation>,
    details: HashMap<i64, DetailBundle>,
    attributes: HashMap<i64, Vec<(String, String)>>,
    term_counts: HashMap<(String, Platform), i64>,
    fail_listing_for: HashSet<String>,
    fail_detail_for: HashSet<i64>,
}

/// In-memory [`ProductStore`] with the same observable behavior as the
/// SQL store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `save_listing` fail for this natural key, with no write.
    pub fn fail_listing_saves_for(&self, platform_product_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_listing_for
            .insert(platform_product_id.to_string());
    }

    /// Make `replace_detail` fail for this product id, with no write.
    pub fn fail_detail_saves_for(&self, product_id: i64) {
        self.inner
            .lock()
            .unwrap()
            .fail_detail_for
            .insert(product_id);
    }

    pub fn products(&self) -> Vec<StoredProduct> {
        self.inner.lock().unwrap().products.clone()
    }

    pub fn observations(&self) -> Vec<StoredObservation> {
        self.inner.lock().unwrap().observations.clone()
    }

    pub fn detail(&self, product_id: i64) -> Option<DetailBundle> {
        self.inner.lock().unwrap().details.get(&product_id).cloned()
    }

    /// Stored attributes of a product, sorted by name for stable asserts.
    pub fn attributes(&self, product_id: i64) -> Vec<(String, String)> {
        let mut attrs = self
            .inner
            .lock()
            .unwrap()
            .attributes
            .get(&product_id)
            .cloned()
            .unwrap_or_default();
        attrs.sort();
        attrs
    }

    pub fn term_count(&self, term: &str, platform: Platform) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .term_counts
            .get(&(term.to_string(), platform))
            .copied()
            .unwrap_or(0)
    }

    fn upsert_inner(inner: &mut MemoryInner, candidate: &ProductCandidate) -> ProductUpsert {
        if let Some(existing) = inner.products.iter_mut().find(|p| {
            p.platform == candidate.platform
                && p.platform_product_id == candidate.platform_product_id
        }) {
            existing.link = candidate.link.clone();
            existing.title = candidate.title.clone();
            existing.brand = candidate.brand.clone();
            return ProductUpsert {
                id: existing.id,
                is_new: false,
            };
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.products.push(StoredProduct {
            id,
            platform: candidate.platform,
            platform_product_id: candidate.platform_product_id.clone(),
            link: candidate.link.clone(),
            title: candidate.title.clone(),
            brand: candidate.brand.clone(),
        });
        ProductUpsert { id, is_new: true }
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn upsert_product(
        &self,
        candidate: &ProductCandidate,
    ) -> Result<ProductUpsert, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(Self::upsert_inner(&mut inner, candidate))
    }

    async fn save_listing(
        &self,
        candidate: &ProductCandidate,
        observation: &NewObservation,
    ) -> Result<ProductUpsert, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .fail_listing_for
            .contains(&candidate.platform_product_id)
        {
            return Err(PersistenceError::new("listing save", "injected failure"));
        }
        let upsert = Self::upsert_inner(&mut inner, candidate);
        inner.observations.push(StoredObservation {
            product_id: upsert.id,
            price: observation.price,
            campaign_price: observation.campaign_price,
            stock_status: observation.stock_status.clone(),
        });
        Ok(upsert)
    }

    async fn bump_term_count(
        &self,
        term: &str,
        platform: Platform,
        new_products: u32,
    ) -> Result<i64, PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        let count = inner
            .term_counts
            .entry((term.to_string(), platform))
            .or_insert(0);
        *count += i64::from(new_products);
        Ok(*count)
    }

    async fn replace_detail(
        &self,
        product_id: i64,
        bundle: &DetailBundle,
    ) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_detail_for.contains(&product_id) {
            return Err(PersistenceError::new("detail replace", "injected failure"));
        }
        inner.details.insert(product_id, bundle.clone());
        inner
            .attributes
            .insert(product_id, bundle.deduped_attributes());
        Ok(())
    }

    async fn products_missing_detail(
        &self,
        platform: Platform,
    ) -> Result<Vec<DetailTarget>, PersistenceError> {
        let inner = self.inner.lock().unwrap();
        let mut targets: Vec<DetailTarget> = inner
            .products
            .iter()
            .filter(|p| p.platform == platform && !inner.details.contains_key(&p.id))
            .filter_map(|p| {
                p.link.as_ref().map(|link| DetailTarget {
                    product_id: p.id,
                    link: link.clone(),
                })
            })
            .collect();
        // Newest sighting first, as the SQL store orders by created_at DESC.
        targets.reverse();
        Ok(targets)
    }
}

/// Listing extractor that replays scripted pages and records every fetch.
#[derive(Default)]
pub struct ScriptedListingExtractor {
    pages: HashMap<(String, u32), Result<ListingPage, ExtractionError>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedListingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, term: &str, page: u32, result: ListingPage) -> Self {
        self.pages.insert((term.to_string(), page), Ok(result));
        self
    }

    pub fn with_failure(mut self, term: &str, page: u32, error: ExtractionError) -> Self {
        self.pages.insert((term.to_string(), page), Err(error));
        self
    }

    /// Every `(term, page)` fetched, in order.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingExtractor for ScriptedListingExtractor {
    async fn fetch_listing_page(
        &self,
        query: &str,
        page: u32,
    ) -> Result<ListingPage, ExtractionError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), page));
        match self.pages.get(&(query.to_string(), page)) {
            Some(result) => result.clone(),
            None => Err(ExtractionError::PageFetch {
                message: format!("no scripted response for ({query}, {page})"),
            }),
        }
    }
}

/// Detail extractor that replays scripted bundles per link.
#[derive(Default)]
pub struct ScriptedDetailExtractor {
    bundles: HashMap<String, Result<DetailBundle, ExtractionError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDetailExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, link: &str, bundle: DetailBundle) -> Self {
        self.bundles.insert(link.to_string(), Ok(bundle));
        self
    }

    pub fn with_failure(mut self, link: &str, error: ExtractionError) -> Self {
        self.bundles.insert(link.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailExtractor for ScriptedDetailExtractor {
    async fn fetch_detail_page(&self, link: &str) -> Result<DetailBundle, ExtractionError> {
        self.calls.lock().unwrap().push(link.to_string());
        match self.bundles.get(link) {
            Some(result) => result.clone(),
            None => Err(ExtractionError::DetailFetch {
                message: format!("no scripted bundle for {link}"),
            }),
        }
    }
}

/// A well-formed raw listing for tests.
pub fn raw_listing(id: &str, link: &str, price_text: &str) -> RawListing {
    RawListing {
        platform_product_id: Some(id.to_string()),
        link: Some(link.to_string()),
        title: Some(format!("Product {id}")),
        brand: Some("TestBrand".to_string()),
        price_text: Some(price_text.to_string()),
        campaign_price_text: None,
        stock_text: Some("Mevcut".to_string()),
    }
}

/// A listing page of well-formed items.
pub fn listing_page(items: Vec<RawListing>, has_pagination: bool) -> ListingPage {
    ListingPage {
        items: items.into_iter().map(Ok).collect(),
        has_pagination,
    }
}
