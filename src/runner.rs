//! Report Runner
//!
//! Entry points for the three report kinds. Each one issues its queries
//! through a [`PaginationDriver`] over an injected [`PageSource`], folds the
//! rows, and returns the finished result; writing files and printing are left
//! to the caller.
//!
//! ## Pipeline
//!
//! 1. **Query**: build a [`ReportQuery`] from configuration and arguments
//! 2. **Fetch**: drain every page sequentially
//! 3. **Fold**: derive and normalize keys into an [`AggregationTable`]
//! 4. **Rank**: sort and annotate with percentages where the report needs it
//!
//! ## Usage Example
//!
//! ```no_run
//! use analytics_report::config::Config;
//! use analytics_report::models::DateRange;
//! use analytics_report::reporting_api::ReportingClient;
//! use analytics_report::runner::ReportRunner;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let client = ReportingClient::new(&config.api)?;
//! let runner = ReportRunner::new(&config, client);
//!
//! let today = chrono::Local::now().date_naive();
//! let range = DateRange::new(today - chrono::Duration::days(365), today);
//! let sources = runner.traffic_sources("rfta.lib.utk.edu/", range).await?;
//! println!("{} sources", sources.len());
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use tracing::{info, info_span, Instrument};

use crate::aggregate::{fold, fold_filtered, leading_dimension_equals, referrer_host, AggregationTable, AliasTable};
use crate::config::Config;
use crate::error::ReportResult;
use crate::models::{DateRange, ReportQuery, Row, SearchTermReport};
use crate::monthly::{MonthlyMatrix, ReportMonth};
use crate::pagination::PaginationDriver;
use crate::rank::{rank, RankedView};
use crate::search_terms::{SearchTermAggregator, SearchTermExtractor};
use crate::source::PageSource;

pub struct ReportRunner<'a, S> {
    config: &'a Config,
    driver: PaginationDriver<S>,
    aliases: AliasTable,
    extractor: SearchTermExtractor,
}

impl<'a, S: PageSource> ReportRunner<'a, S> {
    pub fn new(config: &'a Config, source: S) -> Self {
        Self {
            config,
            driver: PaginationDriver::with_max_pages(source, config.pagination.max_pages),
            aliases: AliasTable::new(config.aliases.clone()),
            extractor: SearchTermExtractor::new(config.search.facet_prefixes.clone()),
        }
    }

    /// Ranked referrer sources for one exact page path.
    pub async fn traffic_sources(&self, page: &str, range: DateRange) -> ReportResult<RankedView> {
        let query = ReportQuery::traffic_sources(&self.config.api.view_id, page, range, self.config.api.page_size);
        let rows = self
            .driver
            .fetch_all(&query)
            .instrument(info_span!("traffic_sources", page))
            .await?;

        let table = fold_filtered(
            &rows,
            leading_dimension_equals(page),
            |row| row.dimension(1).map(|referrer| referrer_host(referrer).to_string()),
            Row::first_metric,
            |raw| self.aliases.normalize(raw),
        );
        info!(page, rows = rows.len(), sources = table.len(), "Folded traffic sources");

        rank(&table)
    }

    /// Search-term table over every path under each of `prefixes`.
    pub async fn search_terms(&self, prefixes: &[String], range: DateRange) -> ReportResult<SearchTermReport> {
        let mut aggregator = SearchTermAggregator::new(&self.extractor);

        for prefix in prefixes {
            let query = ReportQuery::path_prefix(&self.config.api.view_id, prefix, range, self.config.api.page_size);
            let rows = self
                .driver
                .fetch_all(&query)
                .instrument(info_span!("search_terms", prefix = %prefix))
                .await?;
            aggregator.absorb_under(prefix, &rows);
            info!(prefix = %prefix, rows = rows.len(), terms = aggregator.totals().len(), "Folded search paths");
        }

        aggregator.finish()
    }

    /// Views per path for each month. `on_month` sees every month's table as
    /// soon as it is folded.
    pub async fn monthly_views<F>(&self, months: Vec<ReportMonth>, mut on_month: F) -> Result<MonthlyMatrix>
    where
        F: FnMut(&ReportMonth, &AggregationTable) -> Result<()>,
    {
        let host_prefix = self.config.monthly.host_prefix.as_str();
        let mut matrix = MonthlyMatrix::new(months.clone());

        for (column, month) in months.iter().enumerate() {
            let query = ReportQuery::all_paths(&self.config.api.view_id, month.date_range(), self.config.api.page_size);
            let rows = self
                .driver
                .fetch_all(&query)
                .instrument(info_span!("month", label = %month.label))
                .await?;

            let table = fold(
                &rows,
                |row| row.dimension(0).map(|path| format!("{host_prefix}{path}")),
                Row::first_metric,
                str::to_string,
            );
            info!(month = %month.label, rows = rows.len(), paths = table.len(), "Folded month");

            matrix.absorb(column, &table)?;
            on_month(month, &table)?;
        }

        Ok(matrix)
    }
}
