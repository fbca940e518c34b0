//! Run statistics and the end-of-run summary.
//!
//! Counters live in an explicit report value threaded through the run,
//! never in shared module state. The report is what the trigger surface
//! gets back, and what the summary log block is rendered from.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::pagination::StopReason;
use crate::domain::platform::Platform;

/// Failure samples kept in full; beyond this only the count grows.
pub const FAILURE_SAMPLE_LIMIT: usize = 10;

/// Which pass a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Listing,
    Detail,
}

/// One recorded failure with enough context to find the item again.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSample {
    /// Search term being scanned; absent for detail-pass failures.
    pub term: Option<String>,
    pub page: Option<u32>,
    /// Natural key, product id, or link of the failed item, when known.
    pub item: Option<String>,
    pub message: String,
}

/// How traversal of one search term went.
#[derive(Debug, Clone, Serialize)]
pub struct TermOutcome {
    pub term: String,
    pub pages: u32,
    pub items: u64,
    pub new_products: u64,
    /// `None` when the term was cut short by the run deadline or an abort.
    pub stop: Option<StopReason>,
}

/// Aggregate outcome of one ingest or enrich run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub platform: Platform,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processed: u64,
    pub errors: u64,
    pub new_products: u64,
    /// Reason the run aborted early, if it did.
    pub aborted: Option<String>,
    /// The run deadline expired before all work was initiated.
    pub deadline_hit: bool,
    pub terms: Vec<TermOutcome>,
    failures: Vec<FailureSample>,
    dropped_failures: u64,
}

impl RunReport {
    pub fn begin(platform: Platform, kind: RunKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            platform,
            kind,
            started_at: Utc::now(),
            finished_at: None,
            processed: 0,
            errors: 0,
            new_products: 0,
            aborted: None,
            deadline_hit: false,
            terms: Vec::new(),
            failures: Vec::new(),
            dropped_failures: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    pub fn record_new_product(&mut self) {
        self.new_products += 1;
    }

    pub fn record_failure(&mut self, sample: FailureSample) {
        self.errors += 1;
        if self.failures.len() < FAILURE_SAMPLE_LIMIT {
            self.failures.push(sample);
        } else {
            self.dropped_failures += 1;
        }
    }

    pub fn record_term(&mut self, outcome: TermOutcome) {
        self.terms.push(outcome);
    }

    pub fn mark_aborted(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Share of attempted items that succeeded, as a percentage.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.processed + self.errors;
        if attempted == 0 {
            0.0
        } else {
            self.processed as f64 / attempted as f64 * 100.0
        }
    }

    pub fn failures(&self) -> &[FailureSample] {
        &self.failures
    }

    /// Render the end-of-run summary through tracing.
    pub fn emit_summary(&self) {
        let elapsed = self
            .finished_at
            .map(|end| (end - self.started_at).num_seconds());
        info!(
            run_id = %self.run_id,
            platform = %self.platform,
            kind = ?self.kind,
            processed = self.processed,
            errors = self.errors,
            new_products = self.new_products,
            success_rate = %format!("{:.1}%", self.success_rate()),
            elapsed_seconds = elapsed,
            aborted = self.aborted.as_deref(),
            deadline_hit = self.deadline_hit,
            "run summary"
        );
        for failure in &self.failures {
            info!(
                term = failure.term.as_deref(),
                page = failure.page,
                item = failure.item.as_deref(),
                message = %failure.message,
                "sampled failure"
            );
        }
        if self.dropped_failures > 0 {
            info!(dropped = self.dropped_failures, "further failures not sampled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(message: &str) -> FailureSample {
        FailureSample {
            term: None,
            page: None,
            item: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn success_rate_over_attempted_items() {
        let mut report = RunReport::begin(Platform::Trendyol, RunKind::Listing);
        assert_eq!(report.success_rate(), 0.0);
        for _ in 0..9 {
            report.record_success();
        }
        report.record_failure(sample("boom"));
        assert!((report.success_rate() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_samples_are_capped() {
        let mut report = RunReport::begin(Platform::N11, RunKind::Detail);
        for i in 0..(FAILURE_SAMPLE_LIMIT + 3) {
            report.record_failure(sample(&format!("failure {i}")));
        }
        assert_eq!(report.failures().len(), FAILURE_SAMPLE_LIMIT);
        assert_eq!(report.errors, (FAILURE_SAMPLE_LIMIT + 3) as u64);
    }
}
