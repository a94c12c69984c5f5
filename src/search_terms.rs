//! Search Term Extraction
//!
//! Search result pages are recorded as paths of the form
//! `<prefix>/<term>?<params>`, usually with the prefix
//! `host/collections/islandora/search`. The term is the segment right after
//! the queried prefix, with its query string and any `&f` facet suffix cut
//! off. Without a known prefix the fifth `/`-separated segment is used. URLs
//! are sorted into three categories:
//!
//! - `search_term` - a free-text term is present
//! - `facet` - the term segment is a facet query (starts with a facet prefix)
//! - `browse_and_pagination` - there is no term segment at all
//!
//! Only `search_term` URLs contribute to the term table, but every URL's views
//! are tallied against its category.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::aggregate::AggregationTable;
use crate::error::ReportResult;
use crate::models::{CategoryTotals, Row, SearchTermReport, SearchTermSummary};
use crate::rank::rank;

const TERM_SEGMENT: usize = 4;
const COLLECTION_PARAM: &str = "cp=";
const FACET_PARAM: &str = "f[";

pub const DEFAULT_FACET_PREFIX: &str = "utk_mods_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCategory {
    SearchTerm,
    Facet,
    BrowseAndPagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSearchUrl {
    pub category: UrlCategory,
    pub term: Option<String>,
    pub collection: Option<String>,
    pub facets: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchTermExtractor {
    facet_prefixes: Vec<String>,
}

impl Default for SearchTermExtractor {
    fn default() -> Self {
        Self::new(vec![DEFAULT_FACET_PREFIX.to_string()])
    }
}

impl SearchTermExtractor {
    pub fn new(facet_prefixes: Vec<String>) -> Self {
        Self { facet_prefixes }
    }

    pub fn parse(&self, url: &str) -> ParsedSearchUrl {
        self.parse_at(url, TERM_SEGMENT)
    }

    /// Parse a URL returned for a `prefix` query. The term is the segment
    /// following the prefix, however deeply the prefix is nested.
    pub fn parse_under(&self, prefix: &str, url: &str) -> ParsedSearchUrl {
        let prefix = prefix.trim_end_matches('/');
        let segment = if !prefix.is_empty() && url.starts_with(prefix) {
            prefix.split('/').count()
        } else {
            TERM_SEGMENT
        };
        self.parse_at(url, segment)
    }

    fn parse_at(&self, url: &str, segment: usize) -> ParsedSearchUrl {
        let term = url
            .split('/')
            .nth(segment)
            .map(strip_parameters)
            .filter(|term| !term.is_empty());

        let category = match term {
            None => UrlCategory::BrowseAndPagination,
            Some(term) if self.is_facet(term) => UrlCategory::Facet,
            Some(_) => UrlCategory::SearchTerm,
        };

        let params = parameters(url);
        let collection = params
            .clone()
            .find_map(|param| param.strip_prefix(COLLECTION_PARAM))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let facets = params
            .filter(|param| param.starts_with(FACET_PARAM))
            .filter_map(|param| param.split_once('=').map(|(_, value)| value))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();

        ParsedSearchUrl {
            category,
            term: term.map(str::to_string),
            collection,
            facets,
        }
    }

    fn is_facet(&self, term: &str) -> bool {
        self.facet_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && term.starts_with(prefix.as_str()))
    }
}

fn strip_parameters(segment: &str) -> &str {
    let segment = segment.split_once('?').map_or(segment, |(head, _)| head);
    segment.split_once("&f").map_or(segment, |(head, _)| head)
}

/// `key=value` pairs following the first `?` or `&` of the URL.
fn parameters(url: &str) -> impl Iterator<Item = &str> + Clone {
    let region = url.find(['?', '&']).map_or("", |start| &url[start + 1..]);
    region.split(['&', '?']).filter(|param| !param.is_empty())
}

#[derive(Debug, Default)]
struct TermDetail {
    collections: BTreeSet<String>,
    facets: BTreeSet<String>,
    urls: Vec<String>,
}

/// Single-owner accumulator for one search-term report run.
pub struct SearchTermAggregator<'a> {
    extractor: &'a SearchTermExtractor,
    totals: AggregationTable,
    details: HashMap<String, TermDetail>,
    categories: CategoryTotals,
}

impl<'a> SearchTermAggregator<'a> {
    pub fn new(extractor: &'a SearchTermExtractor) -> Self {
        Self {
            extractor,
            totals: AggregationTable::new(),
            details: HashMap::new(),
            categories: CategoryTotals::default(),
        }
    }

    /// Fold rows whose first dimension is a page path and first metric a view count.
    pub fn absorb<'r>(&mut self, rows: impl IntoIterator<Item = &'r Row>) {
        for row in rows {
            let Some(url) = row.dimension(0) else {
                continue;
            };
            self.record(url, row.first_metric());
        }
    }

    /// Like [`absorb`](Self::absorb) for rows fetched with a `prefix` query.
    pub fn absorb_under<'r>(&mut self, prefix: &str, rows: impl IntoIterator<Item = &'r Row>) {
        for row in rows {
            let Some(url) = row.dimension(0) else {
                continue;
            };
            let parsed = self.extractor.parse_under(prefix, url);
            self.record_parsed(url, parsed, row.first_metric());
        }
    }

    pub fn record(&mut self, url: &str, views: u64) {
        let parsed = self.extractor.parse(url);
        self.record_parsed(url, parsed, views);
    }

    fn record_parsed(&mut self, url: &str, parsed: ParsedSearchUrl, views: u64) {
        match parsed.category {
            UrlCategory::BrowseAndPagination => {
                self.categories.browse_and_pagination =
                    self.categories.browse_and_pagination.saturating_add(views);
            }
            UrlCategory::Facet => {
                self.categories.facet = self.categories.facet.saturating_add(views);
            }
            UrlCategory::SearchTerm => {
                self.categories.search_term = self.categories.search_term.saturating_add(views);
                let Some(term) = parsed.term else {
                    return;
                };
                let detail = self.details.entry(term.clone()).or_default();
                detail.collections.extend(parsed.collection);
                detail.facets.extend(parsed.facets);
                detail.urls.push(url.to_string());
                self.totals.add(term, views);
            }
        }
    }

    pub fn totals(&self) -> &AggregationTable {
        &self.totals
    }

    pub fn categories(&self) -> &CategoryTotals {
        &self.categories
    }

    pub fn finish(mut self) -> ReportResult<SearchTermReport> {
        let ranked = rank(&self.totals)?;
        let sum_of_percentages = ranked.sum_of_percentages();

        let terms = ranked
            .entries
            .into_iter()
            .map(|entry| {
                let detail = self.details.remove(&entry.key).unwrap_or_default();
                SearchTermSummary {
                    term: entry.key,
                    total: entry.measure,
                    percentage: entry.percentage,
                    collections: detail.collections.into_iter().collect(),
                    facets: detail.facets.into_iter().collect(),
                    urls: detail.urls,
                }
            })
            .collect();

        Ok(SearchTermReport {
            total: ranked.total,
            sum_of_percentages,
            categories: self.categories,
            terms,
        })
    }
}
