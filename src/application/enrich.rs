//! Detail-enrichment engine.
//!
//! Walks stored products that have no detail row yet, fetches each
//! product page through the detail extractor, and applies the wholesale
//! detail/attribute replacement. A failed extraction writes nothing, so
//! previously stored detail survives until a pass succeeds.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::application::report::{FailureSample, RunKind, RunReport};
use crate::domain::extraction::DetailExtractor;
use crate::domain::platform::Platform;
use crate::domain::store::ProductStore;

/// Knobs for one detail pass.
#[derive(Debug, Clone, Default)]
pub struct EnrichOptions {
    /// Wall-clock bound; once exceeded no further product is fetched.
    pub deadline: Option<Duration>,
}

/// Detail-pass engine for one platform.
pub struct EnrichEngine<'a, S, X> {
    platform: Platform,
    store: &'a S,
    extractor: &'a X,
    options: EnrichOptions,
}

impl<'a, S, X> EnrichEngine<'a, S, X>
where
    S: ProductStore,
    X: DetailExtractor,
{
    pub fn new(platform: Platform, store: &'a S, extractor: &'a X, options: EnrichOptions) -> Self {
        Self {
            platform,
            store,
            extractor,
            options,
        }
    }

    /// Run the detail pass and return the aggregated report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::begin(self.platform, RunKind::Detail);
        let deadline = self.options.deadline.map(|d| Instant::now() + d);

        let targets = match self.store.products_missing_detail(self.platform).await {
            Ok(targets) => targets,
            Err(err) => {
                error!(platform = %self.platform, error = %err, "could not select products for enrichment");
                report.mark_aborted(err.to_string());
                report.finish();
                report.emit_summary();
                return report;
            }
        };
        info!(platform = %self.platform, pending = targets.len(), "detail run started");
        if targets.is_empty() {
            warn!(platform = %self.platform, "no products awaiting detail enrichment");
        }

        for (index, target) in targets.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(remaining = targets.len() - index, "run deadline reached, stopping new work");
                report.deadline_hit = true;
                break;
            }
            debug!(
                product_id = target.product_id,
                link = %target.link,
                index = index + 1,
                total = targets.len(),
                "enriching product"
            );

            let bundle = match self.extractor.fetch_detail_page(&target.link).await {
                Ok(bundle) => bundle,
                Err(err) if err.is_fatal() => {
                    error!(product_id = target.product_id, error = %err, "fetch engine unreachable, aborting run");
                    report.record_failure(FailureSample {
                        term: None,
                        page: None,
                        item: Some(target.product_id.to_string()),
                        message: err.to_string(),
                    });
                    report.mark_aborted(err.to_string());
                    break;
                }
                Err(err) => {
                    warn!(product_id = target.product_id, link = %target.link, error = %err, "detail extraction failed, product left untouched");
                    report.record_failure(FailureSample {
                        term: None,
                        page: None,
                        item: Some(target.product_id.to_string()),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            match self.store.replace_detail(target.product_id, &bundle).await {
                Ok(()) => {
                    report.record_success();
                    debug!(
                        product_id = target.product_id,
                        attributes = bundle.attributes.len(),
                        "detail stored"
                    );
                }
                Err(err) => {
                    warn!(product_id = target.product_id, error = %err, "detail persistence failed, continuing");
                    report.record_failure(FailureSample {
                        term: None,
                        page: None,
                        item: Some(target.product_id.to_string()),
                        message: err.to_string(),
                    });
                }
            }
        }

        report.finish();
        report.emit_summary();
        report
    }
}
