//! Marketplace platforms covered by the pipeline.
//!
//! The platform is the partition key of the product identity space:
//! `platform_product_id` values are unique only within one platform.
//! The ingestion core never branches on the concrete platform beyond
//! carrying it through to storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A marketplace source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Trendyol,
    Hepsiburada,
    N11,
    Avansas,
}

impl Platform {
    /// All supported platforms, in the order their crawls are usually scheduled.
    pub const ALL: [Platform; 4] = [
        Platform::Trendyol,
        Platform::Hepsiburada,
        Platform::N11,
        Platform::Avansas,
    ];

    /// Stable lowercase identifier used in storage and log file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Trendyol => "trendyol",
            Platform::Hepsiburada => "hepsiburada",
            Platform::N11 => "n11",
            Platform::Avansas => "avansas",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trendyol" => Ok(Platform::Trendyol),
            "hepsiburada" => Ok(Platform::Hepsiburada),
            "n11" => Ok(Platform::N11),
            "avansas" => Ok(Platform::Avansas),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_identifiers() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" Trendyol ".parse::<Platform>().unwrap(), Platform::Trendyol);
        assert!("amazon".parse::<Platform>().is_err());
    }
}
