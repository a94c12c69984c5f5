//! Key Aggregation
//!
//! Folds rows into an [`AggregationTable`]: key → accumulated measure. Each use
//! case supplies how a key is derived from a row, how the measure is read, and
//! how raw keys are canonicalized (usually through an [`AliasTable`]).
//!
//! Totals do not depend on row order. The table remembers the order in which
//! keys first appeared, which only matters as the ranking tie-break.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::models::Row;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationTable {
    entries: Vec<(String, u64)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to `key`, inserting the key if it is new.
    pub fn add(&mut self, key: String, value: u64) {
        match self.index.get(&key) {
            Some(&slot) => {
                let measure = &mut self.entries[slot].1;
                *measure = measure.saturating_add(value);
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn merge(&mut self, other: &AggregationTable) {
        for (key, value) in &other.entries {
            self.add(key.clone(), *value);
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, (_, value)| acc.saturating_add(*value))
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl FromIterator<(String, u64)> for AggregationTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, value) in iter {
            table.add(key, value);
        }
        table
    }
}

/// Static mapping from raw identifiers (referrer hosts and the like) to
/// canonical labels. Unknown identifiers pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Fold `rows` into a fresh table. Rows for which `key_fn` yields `None` are
/// skipped.
pub fn fold<'r, I, K, V, N>(rows: I, key_fn: K, value_fn: V, normalize_fn: N) -> AggregationTable
where
    I: IntoIterator<Item = &'r Row>,
    K: Fn(&Row) -> Option<String>,
    V: Fn(&Row) -> u64,
    N: Fn(&str) -> String,
{
    fold_filtered(rows, |_| true, key_fn, value_fn, normalize_fn)
}

/// Like [`fold`], discarding rows rejected by `keep` first.
pub fn fold_filtered<'r, I, F, K, V, N>(
    rows: I,
    keep: F,
    key_fn: K,
    value_fn: V,
    normalize_fn: N,
) -> AggregationTable
where
    I: IntoIterator<Item = &'r Row>,
    F: Fn(&Row) -> bool,
    K: Fn(&Row) -> Option<String>,
    V: Fn(&Row) -> u64,
    N: Fn(&str) -> String,
{
    let mut table = AggregationTable::new();
    let mut discarded = 0usize;

    for row in rows {
        if !keep(row) {
            discarded += 1;
            continue;
        }
        let Some(raw_key) = key_fn(row) else {
            discarded += 1;
            continue;
        };
        table.add(normalize_fn(&raw_key), value_fn(row));
    }

    trace!(keys = table.len(), discarded, "Folded rows");
    table
}

/// Row filter guarding against prefix matches: keep only rows whose leading
/// dimension is exactly `expected`.
pub fn leading_dimension_equals(expected: &str) -> impl Fn(&Row) -> bool + '_ {
    move |row| row.dimension(0) == Some(expected)
}

/// Host part of a referrer such as `t.co/abc` or `www.google.com/search`.
/// Values without a host (`(direct)`, `google`) come back unchanged.
pub fn referrer_host(referrer: &str) -> &str {
    let without_scheme = referrer
        .split_once("://")
        .map_or(referrer, |(_, rest)| rest);
    without_scheme
        .split(['/', '?'])
        .next()
        .unwrap_or(without_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(path: &str, referrer: &str, views: u64) -> Row {
        Row::new(vec![path.to_string(), referrer.to_string()], vec![views])
    }

    #[test]
    fn test_add_accumulates_existing_key() {
        let mut table = AggregationTable::new();
        table.add("a".into(), 2);
        table.add("b".into(), 1);
        table.add("a".into(), 3);
        assert_eq!(table.get("a"), Some(5));
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 6);
    }

    #[test]
    fn test_insertion_order_is_first_seen() {
        let table: AggregationTable = vec![("z".to_string(), 1), ("a".to_string(), 1), ("z".to_string(), 4)]
            .into_iter()
            .collect();
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_saturating_measure() {
        let mut table = AggregationTable::new();
        table.add("a".into(), u64::MAX);
        table.add("a".into(), 10);
        assert_eq!(table.get("a"), Some(u64::MAX));
    }

    #[test]
    fn test_fold_skips_rows_without_key() {
        let rows = vec![row("/a", "x", 1), Row::new(vec!["/b".into()], vec![9])];
        let table = fold(
            &rows,
            |r| r.dimension(1).map(str::to_string),
            Row::first_metric,
            str::to_string,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.total(), 1);
    }

    #[test]
    fn test_leading_dimension_filter_rejects_prefix_matches() {
        let rows = vec![
            row("rfta.lib.utk.edu/", "google", 4),
            row("rfta.lib.utk.edu/?utm_source=x", "google", 100),
        ];
        let table = fold_filtered(
            &rows,
            leading_dimension_equals("rfta.lib.utk.edu/"),
            |r| r.dimension(1).map(str::to_string),
            Row::first_metric,
            str::to_string,
        );
        assert_eq!(table.get("google"), Some(4));
    }

    #[test]
    fn test_referrer_host() {
        assert_eq!(referrer_host("t.co/abc123"), "t.co");
        assert_eq!(referrer_host("https://www.google.com/search?q=x"), "www.google.com");
        assert_eq!(referrer_host("(direct)"), "(direct)");
        assert_eq!(referrer_host("google"), "google");
    }

    #[test]
    fn test_alias_passthrough() {
        let aliases = AliasTable::new(HashMap::from([("t.co".to_string(), "twitter".to_string())]));
        assert_eq!(aliases.normalize("t.co"), "twitter");
        assert_eq!(aliases.normalize("bing"), "bing");
    }
}
