//! Pagination Driver
//!
//! Drains a [`PageSource`] into one ordered row sequence. The loop is
//! iterative: each page's cursor is fed back with the unchanged query until a
//! page arrives without one.
//!
//! Two guards stop a misbehaving source from looping forever:
//! - a cursor that was already used in this run (`c1 -> c1`, `c1 -> c2 -> c1`)
//! - more than `max_pages` pages
//!
//! Both fail with [`ReportError::ExhaustedPagination`].

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{ExhaustionReason, ReportError, ReportResult};
use crate::models::{Cursor, ReportQuery, Row};
use crate::source::PageSource;

pub const DEFAULT_MAX_PAGES: usize = 1000;

pub struct PaginationDriver<S> {
    source: S,
    max_pages: usize,
}

impl<S: PageSource> PaginationDriver<S> {
    pub fn new(source: S) -> Self {
        Self::with_max_pages(source, DEFAULT_MAX_PAGES)
    }

    pub fn with_max_pages(source: S, max_pages: usize) -> Self {
        Self {
            source,
            max_pages: max_pages.max(1),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub async fn fetch_all(&self, query: &ReportQuery) -> ReportResult<Vec<Row>> {
        let mut rows = Vec::new();
        let mut seen: HashSet<Cursor> = HashSet::new();
        let mut cursor: Option<Cursor> = None;
        let mut pages = 0usize;

        loop {
            let page = self.source.fetch_page(query, cursor.as_ref()).await?;
            pages += 1;

            debug!(
                page = pages,
                rows = page.rows.len(),
                cursor = cursor.as_ref().map(Cursor::as_str),
                has_next = page.next_cursor.is_some(),
                "Fetched report page"
            );
            rows.extend(page.rows);

            let Some(next) = page.next_cursor else {
                break;
            };

            if let Some(current) = cursor.take() {
                seen.insert(current);
            }
            if seen.contains(&next) {
                return Err(ReportError::ExhaustedPagination {
                    pages,
                    cursor: next.to_string(),
                    reason: ExhaustionReason::RepeatedCursor,
                });
            }
            if pages >= self.max_pages {
                return Err(ReportError::ExhaustedPagination {
                    pages,
                    cursor: next.to_string(),
                    reason: ExhaustionReason::PageLimit,
                });
            }
            cursor = Some(next);
        }

        info!(pages, rows = rows.len(), view_id = %query.view_id, "Pagination complete");
        Ok(rows)
    }
}
