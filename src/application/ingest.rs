//! Listing-scan engine.
//!
//! Drives one platform's listing run: term by term, page by page under
//! pagination control, item by item through normalize → resolve identity
//! → persist. Item and page failures are isolated and counted; only an
//! unreachable fetch engine aborts the run.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::application::report::{FailureSample, RunKind, RunReport, TermOutcome};
use crate::domain::errors::{ExtractionError, IngestError};
use crate::domain::extraction::ListingExtractor;
use crate::domain::listing::{NewObservation, ProductCandidate, RawListing};
use crate::domain::pagination::{PageVerdict, PaginationController, StopReason};
use crate::domain::platform::Platform;
use crate::domain::price::PriceSnapshot;
use crate::domain::store::{ProductStore, ProductUpsert};

/// Result pages fetched per term unless configured otherwise.
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// Knobs for one listing-scan run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub max_pages: u32,
    /// Wall-clock bound for the whole run. Once exceeded, no new term or
    /// page work starts; in-flight item commits finish.
    pub deadline: Option<Duration>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            deadline: None,
        }
    }
}

/// Listing-scan engine for one platform.
pub struct IngestEngine<'a, S, X> {
    platform: Platform,
    store: &'a S,
    extractor: &'a X,
    options: IngestOptions,
}

impl<'a, S, X> IngestEngine<'a, S, X>
where
    S: ProductStore,
    X: ListingExtractor,
{
    pub fn new(platform: Platform, store: &'a S, extractor: &'a X, options: IngestOptions) -> Self {
        Self {
            platform,
            store,
            extractor,
            options,
        }
    }

    /// Run the listing scan over `terms` and return the aggregated report.
    /// The report is produced on every path, aborted runs included.
    pub async fn run(&self, terms: &[String]) -> RunReport {
        let mut report = RunReport::begin(self.platform, RunKind::Listing);
        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        info!(
            platform = %self.platform,
            terms = terms.len(),
            max_pages = self.options.max_pages,
            "listing run started"
        );

        'terms: for (term_index, term) in terms.iter().enumerate() {
            if deadline_passed(deadline) {
                warn!(remaining_terms = terms.len() - term_index, "run deadline reached, stopping new work");
                report.deadline_hit = true;
                break;
            }
            info!(term = %term, index = term_index + 1, total = terms.len(), "scanning term");

            let mut pager = PaginationController::new(self.options.max_pages);
            let mut pages_ingested = 0u32;
            let mut term_items = 0u64;
            let mut term_new = 0u32;

            while let Some(page_no) = pager.next_page() {
                if deadline_passed(deadline) {
                    warn!(term = %term, page = page_no, "run deadline reached mid-term");
                    report.deadline_hit = true;
                    self.close_term(&mut report, term, pages_ingested, term_items, term_new, None)
                        .await;
                    break 'terms;
                }

                let page = match self.extractor.fetch_listing_page(term, page_no).await {
                    Ok(page) => page,
                    Err(err) if err.is_fatal() => {
                        error!(term = %term, page = page_no, error = %err, "fetch engine unreachable, aborting run");
                        report.record_failure(FailureSample {
                            term: Some(term.clone()),
                            page: Some(page_no),
                            item: None,
                            message: err.to_string(),
                        });
                        report.mark_aborted(err.to_string());
                        self.close_term(&mut report, term, pages_ingested, term_items, term_new, None)
                            .await;
                        break 'terms;
                    }
                    Err(err) => {
                        warn!(term = %term, page = page_no, error = %err, "page fetch failed, skipping page");
                        report.record_failure(FailureSample {
                            term: Some(term.clone()),
                            page: Some(page_no),
                            item: None,
                            message: err.to_string(),
                        });
                        pager.skip_failed_page();
                        continue;
                    }
                };

                match pager.assess(&page) {
                    PageVerdict::Halt(reason) => {
                        debug!(term = %term, page = page_no, reason = ?reason, "traversal halted");
                        break;
                    }
                    PageVerdict::Ingest => {}
                }
                pages_ingested += 1;
                debug!(term = %term, page = page_no, items = page.items.len(), "page fetched");

                for raw in &page.items {
                    match self.process_item(raw).await {
                        Ok(upsert) => {
                            term_items += 1;
                            report.record_success();
                            if upsert.is_new {
                                term_new += 1;
                                report.record_new_product();
                            }
                        }
                        Err((item, err)) => {
                            warn!(term = %term, page = page_no, error = %err, "item failed, continuing");
                            report.record_failure(FailureSample {
                                term: Some(term.clone()),
                                page: Some(page_no),
                                item,
                                message: err.to_string(),
                            });
                        }
                    }
                }
            }

            let stop = pager.stop_reason();
            self.close_term(&mut report, term, pages_ingested, term_items, term_new, stop)
                .await;
        }

        report.finish();
        report.emit_summary();
        report
    }

    /// Normalize, resolve identity, and persist one raw listing. The
    /// failed variant carries the item identifier when one was extracted.
    async fn process_item(
        &self,
        raw: &Result<RawListing, ExtractionError>,
    ) -> Result<ProductUpsert, (Option<String>, IngestError)> {
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) => return Err((None, IngestError::Extraction(err.clone()))),
        };
        let candidate = ProductCandidate::resolve(self.platform, raw)
            .map_err(|err| (raw.platform_product_id.clone(), IngestError::Identity(err)))?;
        let snapshot = PriceSnapshot::derive(
            raw.price_text.as_deref(),
            raw.campaign_price_text.as_deref(),
        );
        let observation = NewObservation {
            price: snapshot.price,
            campaign_price: snapshot.campaign_price,
            stock_status: raw.stock_text.clone(),
        };
        let upsert = self
            .store
            .save_listing(&candidate, &observation)
            .await
            .map_err(|err| {
                (
                    Some(candidate.platform_product_id.clone()),
                    IngestError::Persistence(err),
                )
            })?;
        debug!(
            item = %candidate.platform_product_id,
            price = observation.price,
            is_new = upsert.is_new,
            "listing stored"
        );
        Ok(upsert)
    }

    /// Record the term outcome and bump the search-term counter when the
    /// term discovered new products. A counter failure is logged but does
    /// not fail items already committed.
    async fn close_term(
        &self,
        report: &mut RunReport,
        term: &str,
        pages: u32,
        items: u64,
        new_products: u32,
        stop: Option<StopReason>,
    ) {
        if new_products > 0 {
            match self
                .store
                .bump_term_count(term, self.platform, new_products)
                .await
            {
                Ok(total) => {
                    info!(term = %term, new_products, total, "search term counter updated");
                }
                Err(err) => {
                    warn!(term = %term, error = %err, "search term counter update failed");
                }
            }
        }
        info!(
            term = %term,
            pages,
            items,
            new_products,
            stop = ?stop,
            "term finished"
        );
        report.record_term(TermOutcome {
            term: term.to_string(),
            pages,
            items,
            new_products: new_products as u64,
            stop,
        });
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
