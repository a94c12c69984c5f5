//! Month ranges and the per-path month matrix.

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::aggregate::AggregationTable;
use crate::models::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMonth {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl ReportMonth {
    pub fn containing(day: NaiveDate) -> Option<Self> {
        let start = day.with_day(1)?;
        let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self {
            start,
            end,
            label: start.format("%b %Y").to_string(),
        })
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }
}

/// Parse a `YYYY-MM` month argument into the first day of that month.
pub fn parse_month(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .with_context(|| format!("Invalid month: {value}. Use YYYY-MM"))
}

/// Every calendar month from the month of `from` through the month of `to`.
pub fn month_range(from: NaiveDate, to: NaiveDate) -> Result<Vec<ReportMonth>> {
    let first = ReportMonth::containing(from).context("Month start out of range")?;
    let last = ReportMonth::containing(to).context("Month end out of range")?;
    if first.start > last.start {
        anyhow::bail!("Month range is reversed: {} is after {}", first.label, last.label);
    }

    let mut months = Vec::new();
    let mut cursor = first;
    loop {
        let done = cursor.start == last.start;
        let next_start = cursor.end.succ_opt();
        months.push(cursor);
        if done {
            break;
        }
        cursor = next_start
            .and_then(ReportMonth::containing)
            .context("Month range overflowed the calendar")?;
    }
    Ok(months)
}

/// Views per path per month. Rows are paths in first-seen order, columns are
/// the months the matrix was built with.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyMatrix {
    months: Vec<ReportMonth>,
    paths: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    counts: Vec<Vec<u64>>,
}

impl MonthlyMatrix {
    pub fn new(months: Vec<ReportMonth>) -> Self {
        Self {
            months,
            paths: Vec::new(),
            index: HashMap::new(),
            counts: Vec::new(),
        }
    }

    pub fn months(&self) -> &[ReportMonth] {
        &self.months
    }

    /// Write one month's folded table into its column.
    pub fn absorb(&mut self, month: usize, table: &AggregationTable) -> Result<()> {
        if month >= self.months.len() {
            anyhow::bail!("Month column {month} out of range ({} months)", self.months.len());
        }
        let width = self.months.len();
        for (path, views) in table.iter() {
            let row = match self.index.get(path) {
                Some(&row) => row,
                None => {
                    self.index.insert(path.to_string(), self.paths.len());
                    self.paths.push(path.to_string());
                    self.counts.push(vec![0; width]);
                    self.paths.len() - 1
                }
            };
            let cell = &mut self.counts[row][month];
            *cell = cell.saturating_add(views);
        }
        Ok(())
    }

    pub fn views(&self, path: &str, month: usize) -> Option<u64> {
        let row = *self.index.get(path)?;
        self.counts[row].get(month).copied()
    }

    /// `(path, counts per month)` in first-seen order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.paths
            .iter()
            .zip(&self.counts)
            .map(|(path, counts)| (path.as_str(), counts.as_slice()))
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn month_total(&self, month: usize) -> u64 {
        self.counts
            .iter()
            .filter_map(|counts| counts.get(month))
            .fold(0u64, |acc, views| acc.saturating_add(*views))
    }
}
