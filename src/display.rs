//! Output Formatting and Display Management
//!
//! Human-readable coloured terminal output and structured JSON output for
//! finished reports.
//!
//! ### Report Types
//! - **Traffic sources**: ranked sources for one page with view counts and shares
//! - **Search terms**: top terms with category tallies
//! - **Monthly**: per-month totals and distinct path counts
//!
//! When `json_output` is enabled every report is printed as pretty JSON on
//! stdout so it can be piped; logs go to stderr.

use crate::models::SearchTermReport;
use crate::monthly::MonthlyMatrix;
use crate::rank::RankedView;
use colored::Colorize;
use serde::Serialize;

pub struct DisplayManager {
    json_output: bool,
}

impl DisplayManager {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    fn print_json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing report to JSON: {}", e),
        }
    }

    fn banner(&self, title: &str) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", title.bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());
    }

    pub fn display_sources(&self, page: &str, view: &RankedView, limit: Option<usize>) {
        if self.json_output {
            self.print_json(&sources_json(page, view));
            return;
        }

        self.banner(&format!("Traffic Sources - {}", page));
        println!(
            "\n{} {} sources • {} views\n",
            "📊".bright_yellow(),
            view.len().to_string().bright_white().bold(),
            view.total.to_string().bright_green().bold()
        );

        let shown = view.top(limit.unwrap_or(view.len()));
        for entry in shown {
            println!(
                "   {}: {} ({})",
                entry.key.bright_cyan(),
                entry.measure.to_string().bright_green(),
                entry.display_percentage().bright_yellow()
            );
        }
        if shown.len() < view.len() {
            println!("   … {} more", view.len() - shown.len());
        }
        println!(
            "\n   Percentages sum to {}",
            format!("{:.1}%", view.sum_of_percentages()).bright_white()
        );
    }

    pub fn display_search_terms(&self, report: &SearchTermReport, limit: usize) {
        if self.json_output {
            self.print_json(report);
            return;
        }

        self.banner("Search Terms");
        println!(
            "\n{} {} terms • {} views\n",
            "🔎".bright_yellow(),
            report.terms.len().to_string().bright_white().bold(),
            report.total.to_string().bright_green().bold()
        );
        for term in report.terms.iter().take(limit) {
            println!(
                "   {}: {} ({}%)",
                term.term.bright_cyan(),
                term.total.to_string().bright_green(),
                format!("{:.1}", term.percentage).bright_yellow()
            );
        }

        println!("\n{} Views by URL category:", "📂".bright_blue());
        println!("   search_term: {}", report.categories.search_term.to_string().bright_white());
        println!("   facet: {}", report.categories.facet.to_string().bright_white());
        println!(
            "   browse_and_pagination: {}",
            report.categories.browse_and_pagination.to_string().bright_white()
        );
    }

    pub fn display_monthly(&self, matrix: &MonthlyMatrix) {
        if self.json_output {
            let months: Vec<_> = matrix
                .months()
                .iter()
                .enumerate()
                .map(|(i, month)| serde_json::json!({ "month": month.label, "views": matrix.month_total(i) }))
                .collect();
            self.print_json(&serde_json::json!({ "paths": matrix.path_count(), "monthly": months }));
            return;
        }

        self.banner("Monthly Views");
        println!(
            "\n{} {} paths across {} months\n",
            "📅".bright_blue(),
            matrix.path_count().to_string().bright_white().bold(),
            matrix.months().len().to_string().bright_white().bold()
        );
        for (i, month) in matrix.months().iter().enumerate() {
            println!(
                "   {}: {}",
                month.label.bright_white().bold(),
                matrix.month_total(i).to_string().bright_green()
            );
        }
    }
}

fn sources_json(page: &str, view: &RankedView) -> serde_json::Value {
    serde_json::json!({
        "page": page,
        "total": view.total,
        "sum_of_percentages": view.sum_of_percentages(),
        "sources": view.entries,
    })
}
