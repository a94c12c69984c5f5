//! Flat-file export of finished reports.
//!
//! | file | header |
//! |------|--------|
//! | `sources.csv` | `source,views,percentage` |
//! | `search_terms.csv` | `search_term,total` |
//! | `search_terms.json` | full ranked structure |
//! | `monthly.csv` | `path,<month label>...` |
//! | `months/<label>.csv` | `path,views` |

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregate::AggregationTable;
use crate::models::SearchTermReport;
use crate::monthly::MonthlyMatrix;
use crate::rank::RankedView;

pub const SOURCES_CSV: &str = "sources.csv";
pub const SEARCH_TERMS_CSV: &str = "search_terms.csv";
pub const SEARCH_TERMS_JSON: &str = "search_terms.json";
pub const MONTHLY_CSV: &str = "monthly.csv";
pub const MONTHS_DIR: &str = "months";

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    writeln!(w)
}

pub fn write_sources_csv<W: Write>(w: &mut W, view: &RankedView) -> io::Result<()> {
    write_row(w, &["source", "views", "percentage"])?;
    for entry in &view.entries {
        write_row(
            w,
            &[entry.key.clone(), entry.measure.to_string(), format!("{:.1}", entry.percentage)],
        )?;
    }
    Ok(())
}

pub fn write_search_terms_csv<W: Write>(w: &mut W, report: &SearchTermReport) -> io::Result<()> {
    write_row(w, &["search_term", "total"])?;
    for term in &report.terms {
        write_row(w, &[term.term.clone(), term.total.to_string()])?;
    }
    Ok(())
}

pub fn write_monthly_csv<W: Write>(w: &mut W, matrix: &MonthlyMatrix) -> io::Result<()> {
    let header: Vec<&str> = std::iter::once("path")
        .chain(matrix.months().iter().map(|month| month.label.as_str()))
        .collect();
    write_row(w, &header)?;
    for (path, counts) in matrix.rows() {
        let row: Vec<String> = std::iter::once(path.to_string())
            .chain(counts.iter().map(u64::to_string))
            .collect();
        write_row(w, &row)?;
    }
    Ok(())
}

pub fn write_month_csv<W: Write>(w: &mut W, table: &AggregationTable) -> io::Result<()> {
    write_row(w, &["path", "views"])?;
    for (path, views) in table.iter() {
        write_row(w, &[path.to_string(), views.to_string()])?;
    }
    Ok(())
}

pub fn write_json<W: Write, T: Serialize>(w: W, value: &T, pretty: bool) -> serde_json::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(w, value)
    } else {
        serde_json::to_writer(w, value)
    }
}

fn ensure_directory(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

fn write_file<F>(path: PathBuf, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote report file");
    Ok(path)
}

/// Writes report artifacts under one output directory.
pub struct ReportWriter {
    directory: PathBuf,
    json_pretty: bool,
}

impl ReportWriter {
    pub fn new(directory: impl Into<PathBuf>, json_pretty: bool) -> Self {
        Self {
            directory: directory.into(),
            json_pretty,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn sources(&self, view: &RankedView) -> Result<PathBuf> {
        write_file(self.directory.join(SOURCES_CSV), |w| {
            write_sources_csv(w, view).context("Failed to write sources CSV")
        })
    }

    /// Writes both the CSV summary and the JSON audit structure.
    pub fn search_terms(&self, report: &SearchTermReport) -> Result<(PathBuf, PathBuf)> {
        let csv = write_file(self.directory.join(SEARCH_TERMS_CSV), |w| {
            write_search_terms_csv(w, report).context("Failed to write search term CSV")
        })?;
        let json = write_file(self.directory.join(SEARCH_TERMS_JSON), |w| {
            write_json(w, report, self.json_pretty).context("Failed to serialize search terms")
        })?;
        Ok((csv, json))
    }

    pub fn monthly(&self, matrix: &MonthlyMatrix) -> Result<PathBuf> {
        write_file(self.directory.join(MONTHLY_CSV), |w| {
            write_monthly_csv(w, matrix).context("Failed to write monthly CSV")
        })
    }

    pub fn month(&self, label: &str, table: &AggregationTable) -> Result<PathBuf> {
        let path = self.directory.join(MONTHS_DIR).join(format!("{label}.csv"));
        write_file(path, |w| {
            write_month_csv(w, table).context("Failed to write month CSV")
        })
    }
}
