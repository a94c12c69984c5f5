//! Core Data Models
//!
//! Data structures shared by the pagination, aggregation and reporting stages.
//!
//! ## Data Flow
//!
//! 1. **Query**: [`ReportQuery`] - constant description of one reporting request
//! 2. **Fetch**: [`Page`] - one page of [`Row`]s plus an optional [`Cursor`]
//! 3. **Aggregation**: [`crate::aggregate::AggregationTable`] - rows folded by key
//! 4. **Output**: [`crate::rank::RankedView`], [`SearchTermSummary`] - serializable results
//!
//! Rows and pages are transient: they are created by one pagination run and
//! dropped once folded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reporting record: ordered dimensions and ordered metric values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub dimensions: Vec<String>,
    pub metrics: Vec<u64>,
}

impl Row {
    pub fn new(dimensions: Vec<String>, metrics: Vec<u64>) -> Self {
        Self { dimensions, metrics }
    }

    pub fn dimension(&self, index: usize) -> Option<&str> {
        self.dimensions.get(index).map(String::as_str)
    }

    pub fn metric(&self, index: usize) -> Option<u64> {
        self.metrics.get(index).copied()
    }

    /// First metric of the row, 0 when the row carries none.
    pub fn first_metric(&self) -> u64 {
        self.metric(0).unwrap_or(0)
    }
}

/// Opaque continuation token handed back by the reporting API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub rows: Vec<Row>,
    pub next_cursor: Option<Cursor>,
}

impl Page {
    pub fn new(rows: Vec<Row>, next_cursor: Option<Cursor>) -> Self {
        Self { rows, next_cursor }
    }

    pub fn last(rows: Vec<Row>) -> Self {
        Self::new(rows, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    Exact,
    BeginsWith,
}

/// Equality or prefix filter on a single dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionFilter {
    pub dimension: String,
    pub operator: FilterOperator,
    pub expression: String,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Everything except the cursor that identifies a report request. Held
/// constant for the whole of one pagination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub view_id: String,
    pub date_range: DateRange,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub filter: Option<DimensionFilter>,
    pub page_size: u32,
}

pub const DIM_PAGE_PATH: &str = "ga:pagePath";
pub const DIM_FULL_REFERRER: &str = "ga:fullReferrer";
pub const DIM_PAGE_TITLE: &str = "ga:pageTitle";
pub const METRIC_PAGEVIEWS: &str = "ga:pageviews";
pub const METRIC_UNIQUE_PAGEVIEWS: &str = "ga:uniquePageviews";

impl ReportQuery {
    /// Page views of one exact page path broken down by referrer and title.
    pub fn traffic_sources(view_id: &str, page: &str, date_range: DateRange, page_size: u32) -> Self {
        Self {
            view_id: view_id.to_string(),
            date_range,
            dimensions: vec![
                DIM_PAGE_PATH.to_string(),
                DIM_FULL_REFERRER.to_string(),
                DIM_PAGE_TITLE.to_string(),
            ],
            metrics: vec![METRIC_PAGEVIEWS.to_string()],
            filter: Some(DimensionFilter {
                dimension: DIM_PAGE_PATH.to_string(),
                operator: FilterOperator::Exact,
                expression: page.to_string(),
            }),
            page_size,
        }
    }

    /// Unique page views of every path beginning with `prefix`.
    pub fn path_prefix(view_id: &str, prefix: &str, date_range: DateRange, page_size: u32) -> Self {
        Self {
            view_id: view_id.to_string(),
            date_range,
            dimensions: vec![DIM_PAGE_PATH.to_string()],
            metrics: vec![METRIC_UNIQUE_PAGEVIEWS.to_string()],
            filter: Some(DimensionFilter {
                dimension: DIM_PAGE_PATH.to_string(),
                operator: FilterOperator::BeginsWith,
                expression: prefix.to_string(),
            }),
            page_size,
        }
    }

    /// Unique page views of every path in the view.
    pub fn all_paths(view_id: &str, date_range: DateRange, page_size: u32) -> Self {
        Self {
            view_id: view_id.to_string(),
            date_range,
            dimensions: vec![DIM_PAGE_PATH.to_string()],
            metrics: vec![METRIC_UNIQUE_PAGEVIEWS.to_string()],
            filter: None,
            page_size,
        }
    }
}

/// Per-term result of a search-term report.
#[derive(Debug, Clone, Serialize)]
pub struct SearchTermSummary {
    pub term: String,
    pub total: u64,
    pub percentage: f64,
    pub collections: Vec<String>,
    pub facets: Vec<String>,
    pub urls: Vec<String>,
}

/// Views tallied per URL category, including URLs that never become terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub search_term: u64,
    pub facet: u64,
    pub browse_and_pagination: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchTermReport {
    pub total: u64,
    pub sum_of_percentages: f64,
    pub categories: CategoryTotals,
    pub terms: Vec<SearchTermSummary>,
}
