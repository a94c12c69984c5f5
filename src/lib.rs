//! Analytics Report Library
//!
//! Retrieves paginated reporting data from an analytics reporting API and
//! aggregates it into summary statistics for export to flat files.
//!
//! ## Core Features
//!
//! - **Cursor pagination**: drains every page of a report with guards against
//!   cursors that never terminate
//! - **Keyed aggregation**: folds rows by a derived, alias-normalized key
//! - **Ranked percentages**: sorted shares of the total with an explicit
//!   empty-table error
//! - **Search term extraction**: classifies search URLs and keeps an audit
//!   trail of contributing URLs
//! - **Monthly matrices**: per-path view counts across a range of months
//!
//! ## Architecture Overview
//!
//! - [`source`] - the [`source::PageSource`] seam
//! - [`reporting_api`] - HTTP implementation of the page source
//! - [`pagination`] - [`pagination::PaginationDriver`]
//! - [`aggregate`] - [`aggregate::AggregationTable`], folding and alias tables
//! - [`rank`] - [`rank::RankedView`]
//! - [`search_terms`] - search URL parsing and term aggregation
//! - [`monthly`] - month ranges and the per-path month matrix
//! - [`runner`] - [`runner::ReportRunner`] entry points for each report
//! - [`export`] - CSV and JSON writers
//! - [`display`] - terminal and JSON presentation
//! - [`config`] - configuration with file and environment support
//! - [`logging`] - structured logging with JSON and pretty formats

pub mod aggregate;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod monthly;
pub mod pagination;
pub mod rank;
pub mod reporting_api;
pub mod runner;
pub mod search_terms;
pub mod source;

pub use error::{FetchError, ReportError, ReportResult};
pub use runner::ReportRunner;
