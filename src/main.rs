use analytics_report::config::Config;
use analytics_report::display::DisplayManager;
use analytics_report::export::ReportWriter;
use analytics_report::logging;
use analytics_report::models::DateRange;
use analytics_report::monthly::{month_range, parse_month, ReportMonth};
use analytics_report::reporting_api::ReportingClient;
use analytics_report::runner::ReportRunner;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::Instrument;

/// Window used when `--since` is omitted.
const DEFAULT_LOOKBACK_DAYS: i64 = 45;
const DEFAULT_TERM_LIMIT: usize = 25;

#[derive(Parser)]
#[command(name = "analytics-report")]
#[command(about = "Paginated analytics reports: traffic sources, search terms and monthly views")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to analytics-report.toml and friends)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank referrer sources for one exact page path
    Sources {
        /// Page path to report on, matched exactly
        #[arg(long)]
        page: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Show only the top N sources
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Tabulate search terms under the configured collection prefixes
    SearchTerms {
        /// Path prefix to query; repeatable, replaces the configured collections
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Show only the top N terms
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Views per path for every month in a range
    Monthly {
        /// First month (YYYY-MM)
        #[arg(long)]
        from: String,
        /// Last month (YYYY-MM)
        #[arg(long)]
        to: String,
        /// Also write one CSV per month
        #[arg(long)]
        per_month: bool,
    },
}

enum Plan {
    Sources {
        page: String,
        range: DateRange,
        limit: Option<usize>,
    },
    SearchTerms {
        prefixes: Vec<String>,
        range: DateRange,
        limit: usize,
    },
    Monthly {
        months: Vec<ReportMonth>,
        per_month: bool,
    },
}

impl Plan {
    /// Validate arguments before any configuration is read or request sent.
    fn from_command(command: Commands) -> Result<Self> {
        Ok(match command {
            Commands::Sources { page, since, until, limit } => Plan::Sources {
                page,
                range: parse_date_range(since, until)?,
                limit,
            },
            Commands::SearchTerms { prefixes, since, until, limit } => Plan::SearchTerms {
                prefixes,
                range: parse_date_range(since, until)?,
                limit: limit.unwrap_or(DEFAULT_TERM_LIMIT),
            },
            Commands::Monthly { from, to, per_month } => Plan::Monthly {
                months: month_range(parse_month(&from)?, parse_month(&to)?)?,
                per_month,
            },
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Plan::Sources { .. } => "sources",
            Plan::SearchTerms { .. } => "search-terms",
            Plan::Monthly { .. } => "monthly",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, json),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let plan = Plan::from_command(cli.command)?;

    let config = Config::load(cli.config.as_deref())?;
    let _log_guard = logging::init_logging(&config.logging, &config.paths.log_directory);

    let client = ReportingClient::new(&config.api)?;
    let runner = ReportRunner::new(&config, client);
    let writer = ReportWriter::new(&config.output.directory, config.output.json_pretty);
    let display = DisplayManager::new(cli.json);
    let span = logging::run_span(plan.name());

    async {
        match plan {
            Plan::Sources { page, range, limit } => {
                let view = runner.traffic_sources(&page, range).await?;
                let path = writer.sources(&view)?;
                display.display_sources(&page, &view, limit);
                if !cli.json {
                    println!("\n📁 Wrote {}", path.display());
                }
            }
            Plan::SearchTerms { prefixes, range, limit } => {
                let prefixes = if prefixes.is_empty() {
                    config.search.collections.clone()
                } else {
                    prefixes
                };
                if prefixes.is_empty() {
                    anyhow::bail!("No collection prefixes: pass --prefix or set [search] collections");
                }
                let report = runner.search_terms(&prefixes, range).await?;
                let (csv, json) = writer.search_terms(&report)?;
                display.display_search_terms(&report, limit);
                if !cli.json {
                    println!("\n📁 Wrote {} and {}", csv.display(), json.display());
                }
            }
            Plan::Monthly { months, per_month } => {
                let matrix = runner
                    .monthly_views(months, |month, table| {
                        if per_month {
                            writer.month(&month.label, table)?;
                        }
                        Ok(())
                    })
                    .await?;
                let path = writer.monthly(&matrix)?;
                display.display_monthly(&matrix);
                if !cli.json {
                    println!("\n📁 Wrote {}", path.display());
                }
            }
        }
        Ok(())
    }
    .instrument(span)
    .await
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Use YYYY-MM-DD", value))
}

fn parse_date_range(since: Option<String>, until: Option<String>) -> Result<DateRange> {
    let until = match until {
        Some(value) => parse_date(&value)?,
        None => chrono::Local::now().date_naive(),
    };
    let since = match since {
        Some(value) => parse_date(&value)?,
        None => until - chrono::Duration::days(DEFAULT_LOOKBACK_DAYS),
    };
    if since > until {
        anyhow::bail!("Start date {} is after end date {}", since, until);
    }
    Ok(DateRange::new(since, until))
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
