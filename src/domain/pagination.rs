//! Pagination traversal control for one search term.
//!
//! Responsibility:
//! - decide, page by page, whether a fetched result page gets ingested
//! - detect sources that stall (repeat their last page instead of
//!   signaling end-of-results) via accumulated item-link sets
//! - bound traversal at the configured page limit
//!
//! The controller is pure state; fetching and ingestion happen elsewhere.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::listing::ListingPage;

/// Why traversal of a term's result pages ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The very first page had no items; the term is aborted outright.
    EmptyFirstPage,
    /// A later page lacked the pagination affordance the source normally
    /// renders, meaning the result list ended.
    NoPagination,
    /// The page's item links were all seen on earlier pages; the source
    /// has stopped advancing.
    RepeatedResults,
    /// The configured page bound was reached.
    MaxPages,
}

/// Decision about one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// Ingest this page's items, then continue traversal.
    Ingest,
    /// Do not ingest; traversal of this term is over.
    Halt(StopReason),
}

/// Traversal state machine for one search term.
#[derive(Debug)]
pub struct PaginationController {
    max_pages: u32,
    current: u32,
    seen_links: BTreeSet<String>,
    halted: Option<StopReason>,
}

impl PaginationController {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages: max_pages.max(1),
            current: 1,
            seen_links: BTreeSet::new(),
            halted: None,
        }
    }

    /// Page number to fetch next, or `None` once traversal ended.
    pub fn next_page(&self) -> Option<u32> {
        if self.halted.is_some() || self.current > self.max_pages {
            None
        } else {
            Some(self.current)
        }
    }

    /// Feed a fetched page and decide whether its items are ingested.
    pub fn assess(&mut self, page: &ListingPage) -> PageVerdict {
        if self.current == 1 && page.is_empty() {
            return self.halt(StopReason::EmptyFirstPage);
        }
        if self.current > 1 && !page.has_pagination {
            return self.halt(StopReason::NoPagination);
        }
        let links = page.link_set();
        // An empty later page is a subset of anything already seen.
        if self.current > 1 && links.is_subset(&self.seen_links) {
            return self.halt(StopReason::RepeatedResults);
        }
        self.seen_links.extend(links);
        self.advance();
        PageVerdict::Ingest
    }

    /// A page that failed to fetch is skipped; traversal moves on.
    pub fn skip_failed_page(&mut self) {
        self.advance();
    }

    /// Why traversal ended, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.halted
    }

    fn advance(&mut self) {
        self.current += 1;
        if self.current > self.max_pages {
            self.halted = Some(StopReason::MaxPages);
        }
    }

    fn halt(&mut self, reason: StopReason) -> PageVerdict {
        self.halted = Some(reason);
        PageVerdict::Halt(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::RawListing;

    fn page_with_links(links: &[&str], has_pagination: bool) -> ListingPage {
        ListingPage {
            items: links
                .iter()
                .map(|link| {
                    Ok(RawListing {
                        platform_product_id: Some(link.to_string()),
                        link: Some(link.to_string()),
                        ..RawListing::default()
                    })
                })
                .collect(),
            has_pagination,
        }
    }

    #[test]
    fn empty_first_page_aborts_the_term() {
        let mut pager = PaginationController::new(5);
        let verdict = pager.assess(&page_with_links(&[], true));
        assert_eq!(verdict, PageVerdict::Halt(StopReason::EmptyFirstPage));
        assert_eq!(pager.next_page(), None);
    }

    #[test]
    fn repeated_link_subset_stops_traversal() {
        let mut pager = PaginationController::new(5);
        assert_eq!(
            pager.assess(&page_with_links(&["a", "b"], true)),
            PageVerdict::Ingest
        );
        assert_eq!(
            pager.assess(&page_with_links(&["a"], true)),
            PageVerdict::Halt(StopReason::RepeatedResults)
        );
        assert_eq!(pager.next_page(), None);
    }

    #[test]
    fn missing_pagination_affordance_stops_later_pages_only() {
        let mut pager = PaginationController::new(5);
        // A single-page result list legitimately has no pagination bar.
        assert_eq!(
            pager.assess(&page_with_links(&["a"], false)),
            PageVerdict::Ingest
        );
        assert_eq!(
            pager.assess(&page_with_links(&["b"], false)),
            PageVerdict::Halt(StopReason::NoPagination)
        );
    }

    #[test]
    fn page_bound_stops_after_final_page_is_ingested() {
        let mut pager = PaginationController::new(2);
        assert_eq!(pager.next_page(), Some(1));
        pager.assess(&page_with_links(&["a"], true));
        assert_eq!(pager.next_page(), Some(2));
        assert_eq!(
            pager.assess(&page_with_links(&["b"], true)),
            PageVerdict::Ingest
        );
        assert_eq!(pager.next_page(), None);
        assert_eq!(pager.stop_reason(), Some(StopReason::MaxPages));
    }

    #[test]
    fn failed_page_is_skipped_without_halting() {
        let mut pager = PaginationController::new(3);
        pager.assess(&page_with_links(&["a"], true));
        assert_eq!(pager.next_page(), Some(2));
        pager.skip_failed_page();
        assert_eq!(pager.next_page(), Some(3));
    }

    #[test]
    fn fresh_links_on_a_later_page_keep_traversal_going() {
        let mut pager = PaginationController::new(5);
        pager.assess(&page_with_links(&["a", "b"], true));
        assert_eq!(
            pager.assess(&page_with_links(&["b", "c"], true)),
            PageVerdict::Ingest
        );
        assert_eq!(pager.next_page(), Some(3));
    }
}
