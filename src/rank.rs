//! Ranked percentage view over a finished [`AggregationTable`].

use serde::Serialize;

use crate::aggregate::AggregationTable;
use crate::error::{ReportError, ReportResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub measure: u64,
    /// Share of the total, rounded to one decimal place.
    pub percentage: f64,
}

impl RankedEntry {
    pub fn display_percentage(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedView {
    pub total: u64,
    pub entries: Vec<RankedEntry>,
}

impl RankedView {
    /// Sum of the rounded percentages. Lands near 100 but may drift by
    /// rounding.
    pub fn sum_of_percentages(&self) -> f64 {
        self.entries.iter().map(|entry| entry.percentage).sum()
    }

    pub fn top(&self, limit: usize) -> &[RankedEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn round_percentage(measure: u64, total: u64) -> f64 {
    let share = measure as f64 / total as f64 * 100.0;
    (share * 10.0).round() / 10.0
}

/// Sort by measure descending (ties keep first-seen order) and annotate each
/// entry with its share of the total.
pub fn rank(table: &AggregationTable) -> ReportResult<RankedView> {
    let total = table.total();
    if table.is_empty() || total == 0 {
        return Err(ReportError::EmptyAggregation);
    }

    let mut entries: Vec<RankedEntry> = table
        .iter()
        .map(|(key, measure)| RankedEntry {
            key: key.to_string(),
            measure,
            percentage: round_percentage(measure, total),
        })
        .collect();
    entries.sort_by(|a, b| b.measure.cmp(&a.measure));

    Ok(RankedView { total, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, u64)]) -> AggregationTable {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_rank_orders_and_formats() {
        let view = rank(&table(&[("a", 30), ("b", 70)])).unwrap();
        let rendered: Vec<(&str, u64, String)> = view
            .entries
            .iter()
            .map(|e| (e.key.as_str(), e.measure, e.display_percentage()))
            .collect();
        assert_eq!(
            rendered,
            vec![("b", 70, "70.0%".to_string()), ("a", 30, "30.0%".to_string())]
        );
        assert!((view.sum_of_percentages() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_empty_table() {
        assert!(matches!(rank(&AggregationTable::new()), Err(ReportError::EmptyAggregation)));
    }

    #[test]
    fn test_rank_zero_total() {
        let result = rank(&table(&[("a", 0), ("b", 0)]));
        assert!(matches!(result, Err(ReportError::EmptyAggregation)));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let view = rank(&table(&[("late", 5), ("big", 9), ("early", 5)])).unwrap();
        let keys: Vec<&str> = view.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["big", "late", "early"]);
    }

    #[test]
    fn test_rounding_drift_is_reported_not_corrected() {
        let view = rank(&table(&[("a", 1), ("b", 1), ("c", 1)])).unwrap();
        assert_eq!(view.entries[0].display_percentage(), "33.3%");
        assert!((view.sum_of_percentages() - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_top_clamps_to_len() {
        let view = rank(&table(&[("a", 1)])).unwrap();
        assert_eq!(view.top(10).len(), 1);
    }
}
