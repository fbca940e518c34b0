//! Configuration infrastructure.
//!
//! One JSON config file covers the database, both run kinds, and logging.
//! Every field has a default so a missing file yields a usable
//! configuration; the database URL can be overridden from the
//! environment so deployments never write credentials to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::application::{EnrichOptions, IngestOptions};
use crate::application::ingest::DEFAULT_MAX_PAGES;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
    pub enrich: EnrichConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/pricewatch".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Search-term list, one term per line.
    pub terms_file: String,
    /// Result pages fetched per term.
    pub max_pages: u32,
    /// Wall-clock bound for a whole listing run, in seconds.
    pub run_deadline_seconds: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            terms_file: "search_terms/terms.txt".to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            run_deadline_seconds: Some(900),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Wall-clock bound for a whole detail run, in seconds.
    pub run_deadline_seconds: Option<u64>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            run_deadline_seconds: Some(900),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for the per-run log files.
    pub dir: String,
    /// Whether to write the per-run file at all.
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "bot_logs".to_string(),
            file_output: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file. A missing file yields the
    /// defaults; a present but malformed file is an error. Environment
    /// overrides are applied either way.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?
        } else {
            info!(path = %path.display(), "config file missing, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Write the configuration back out, pretty-printed.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, raw)
            .await
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Apply process-environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("PRICEWATCH_DATABASE_URL").or_else(|| get("DATABASE_URL")) {
            self.database.url = url;
        }
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            max_pages: self.ingest.max_pages,
            deadline: self
                .ingest
                .run_deadline_seconds
                .map(std::time::Duration::from_secs),
        }
    }

    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            deadline: self
                .enrich
                .run_deadline_seconds
                .map(std::time::Duration::from_secs),
        }
    }
}
