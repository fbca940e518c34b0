//! Detail-pass data carriers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything a detail extractor recovered from one product page, plus the
/// attribute table. Any field may be absent on a given fetch; a successful
/// pass overwrites the stored detail row wholesale with exactly these
/// values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailBundle {
    pub description: Option<String>,
    pub store_name: Option<String>,
    pub store_rating: Option<f64>,
    pub shipping_info: Option<String>,
    pub free_shipping: bool,
    pub rating: Option<f64>,
    pub product_type: Option<String>,
    pub image_url: Option<String>,
    /// Attribute name/value pairs in page order.
    pub attributes: Vec<(String, String)>,
}

impl DetailBundle {
    /// Attribute set with repeated names dropped, first occurrence wins.
    /// Product pages occasionally render the same attribute twice.
    pub fn deduped_attributes(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        self.attributes
            .iter()
            .filter(|(name, _)| seen.insert(name.clone()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_attribute_names_keep_first_value() {
        let bundle = DetailBundle {
            attributes: vec![
                ("Renk".into(), "Mavi".into()),
                ("Beden".into(), "M".into()),
                ("Renk".into(), "Kirmizi".into()),
            ],
            ..DetailBundle::default()
        };
        assert_eq!(
            bundle.deduped_attributes(),
            vec![
                ("Renk".to_string(), "Mavi".to_string()),
                ("Beden".to_string(), "M".to_string()),
            ]
        );
    }
}
