//! Price text normalization.
//!
//! Marketplace listings render prices as localized text such as
//! `"1.234,56 TL"`. Normalization strips the currency marker and thousands
//! separators, converts the decimal comma, and parses to a two-decimal
//! value. Unusable input degrades to `0.0` rather than failing the item:
//! callers must treat `0.0` as "no usable price extracted", never as a
//! real zero price.

use tracing::warn;

/// Parse localized marketplace price text into a numeric value.
///
/// Absent, empty, or malformed input yields `0.0` with a warning.
pub fn parse_price(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let cleaned = trimmed
        .replace("TL", "")
        .replace('.', "")
        .replace(',', ".");
    match cleaned.trim().parse::<f64>() {
        Ok(value) => round_currency(value),
        Err(_) => {
            warn!(raw = %trimmed, "price text did not parse, degrading to 0.0");
            0.0
        }
    }
}

/// List price plus the optional discounted price for one listing sighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    pub price: f64,
    /// Present only when a discounted price was extracted and differs
    /// from the list price.
    pub campaign_price: Option<f64>,
}

impl PriceSnapshot {
    /// Build a snapshot from the raw price texts of a listing card.
    ///
    /// When only the campaign selector matched, the campaign value becomes
    /// the list price. A campaign value equal to the list price carries no
    /// information and is dropped.
    pub fn derive(price_text: Option<&str>, campaign_text: Option<&str>) -> Self {
        let list = parse_price(price_text);
        let campaign = parse_price(campaign_text);
        if list == 0.0 && campaign > 0.0 {
            return Self {
                price: campaign,
                campaign_price: None,
            };
        }
        let campaign_price = (campaign > 0.0 && campaign != list).then_some(campaign);
        Self {
            price: list,
            campaign_price,
        }
    }
}

fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.234,56 TL", 1234.56)]
    #[case("99,90 TL", 99.9)]
    #[case("12.345 TL", 12345.0)]
    #[case("2.399,00", 2399.0)]
    #[case("  149,50 TL  ", 149.5)]
    #[case("", 0.0)]
    #[case("   ", 0.0)]
    #[case("fiyat bulunamadi", 0.0)]
    fn parses_marketplace_price_text(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(parse_price(Some(raw)), expected);
    }

    #[test]
    fn absent_text_degrades_to_zero() {
        assert_eq!(parse_price(None), 0.0);
    }

    #[test]
    fn campaign_price_kept_only_when_it_differs() {
        let snapshot = PriceSnapshot::derive(Some("100,00 TL"), Some("80,00 TL"));
        assert_eq!(snapshot.price, 100.0);
        assert_eq!(snapshot.campaign_price, Some(80.0));

        let same = PriceSnapshot::derive(Some("100,00 TL"), Some("100,00 TL"));
        assert_eq!(same.campaign_price, None);
    }

    #[test]
    fn campaign_only_listing_promotes_campaign_to_list_price() {
        let snapshot = PriceSnapshot::derive(None, Some("80,00 TL"));
        assert_eq!(snapshot.price, 80.0);
        assert_eq!(snapshot.campaign_price, None);
    }

    #[test]
    fn unpriced_listing_yields_degraded_snapshot() {
        let snapshot = PriceSnapshot::derive(Some("yok"), None);
        assert_eq!(snapshot.price, 0.0);
        assert_eq!(snapshot.campaign_price, None);
    }
}
