//! Listing-pass data carriers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::errors::{ExtractionError, IdentityError};
use crate::domain::platform::Platform;

/// One raw listing record handed over by a listing extractor. Every field
/// beyond the natural key may be missing on a bad card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    pub platform_product_id: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price_text: Option<String>,
    pub campaign_price_text: Option<String>,
    pub stock_text: Option<String>,
}

/// One fetched result page. Cards that failed to parse survive as errors
/// so the fault isolator can count them individually.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub items: Vec<Result<RawListing, ExtractionError>>,
    /// Whether the page carried the pagination affordance the source
    /// normally renders. Meaningful from page 2 onwards.
    pub has_pagination: bool,
}

impl ListingPage {
    /// Item links of the successfully parsed cards, used for stall detection.
    pub fn link_set(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter_map(|item| item.as_ref().ok())
            .filter_map(|raw| raw.link.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A listing that passed identity validation and is ready to persist.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCandidate {
    pub platform: Platform,
    pub platform_product_id: String,
    pub link: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
}

impl ProductCandidate {
    /// Resolve the natural key of a raw listing. A blank key rejects the
    /// item before any row is written.
    pub fn resolve(platform: Platform, raw: &RawListing) -> Result<Self, IdentityError> {
        let key = raw
            .platform_product_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if key.is_empty() {
            return Err(IdentityError::MissingNaturalKey { platform });
        }
        Ok(Self {
            platform,
            platform_product_id: key.to_string(),
            link: raw.link.clone(),
            title: raw.title.clone(),
            brand: raw.brand.clone(),
        })
    }
}

/// One price/stock observation about to be appended to the history.
#[derive(Debug, Clone, Serialize)]
pub struct NewObservation {
    pub price: f64,
    pub campaign_price: Option<f64>,
    pub stock_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: Option<&str>) -> RawListing {
        RawListing {
            platform_product_id: id.map(str::to_string),
            link: Some("https://example.test/p/1".into()),
            title: Some("Test".into()),
            ..RawListing::default()
        }
    }

    #[test]
    fn blank_natural_key_is_rejected() {
        for id in [None, Some(""), Some("   ")] {
            let result = ProductCandidate::resolve(Platform::Trendyol, &raw(id));
            assert!(matches!(
                result,
                Err(IdentityError::MissingNaturalKey { .. })
            ));
        }
    }

    #[test]
    fn natural_key_is_trimmed() {
        let candidate = ProductCandidate::resolve(Platform::N11, &raw(Some(" 42 "))).unwrap();
        assert_eq!(candidate.platform_product_id, "42");
    }

    #[test]
    fn link_set_skips_failed_and_linkless_items() {
        let page = ListingPage {
            items: vec![
                Ok(raw(Some("1"))),
                Ok(RawListing::default()),
                Err(ExtractionError::ItemParse {
                    message: "broken card".into(),
                }),
            ],
            has_pagination: true,
        };
        assert_eq!(page.link_set().len(), 1);
    }
}
