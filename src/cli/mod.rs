use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::logging;
use crate::render;
use crate::services::periods::monthly_labels;
use crate::services::{ReportRequest, ReportService, WorkbookExporter, XLSX_MIME};
use crate::sources;
use crate::tui;
use crate::types::{ReportError, ReportOutcome};

/// Exit status for rejected user input
pub const EXIT_INVALID_INPUT: i32 = 2;
/// Exit status for every other failure
pub const EXIT_FAILURE: i32 = 1;

/// Monthly and daily AI service usage reports per institution
#[derive(Parser)]
#[command(name = "unireport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/unireport/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pin the current date
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How a finished report is delivered
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OutputArgs {
    /// Output as JSON
    #[arg(long, conflicts_with = "tui")]
    json: bool,

    /// Write an .xlsx workbook to the export directory
    #[arg(long)]
    export: bool,

    /// Open the report in the terminal viewer
    #[arg(long)]
    tui: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Month-by-month report
    Monthly {
        /// Institution id
        institution: String,

        /// Restrict to these years
        #[arg(long = "year", value_name = "YYYY")]
        years: Vec<i32>,

        /// Exactly these months (within the selected years)
        #[arg(long = "month", value_name = "YYYY-MM")]
        months: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Day-by-day report over a date range ending yesterday at the latest
    Daily {
        /// Institution id
        institution: String,

        #[arg(long, value_name = "YYYY-MM-DD")]
        from: NaiveDate,

        #[arg(long, value_name = "YYYY-MM-DD")]
        to: NaiveDate,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Per-category usage totals since a year
    Cumulative {
        /// Institution id
        institution: String,

        /// First year included (default: configured start year)
        #[arg(long, value_name = "YYYY")]
        since: Option<i32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        logging::init(self.verbose);

        let config = Config::load(self.config.as_deref()).context("failed to load configuration")?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        debug!(%today, source = ?config.source.kind, "starting");

        let source = sources::from_config(&config.source)?;
        let service = ReportService::new(source.as_ref(), config.categories.clone());

        match self.command {
            Commands::Monthly {
                institution,
                years,
                months,
                output,
            } => {
                let canonical = monthly_labels(config.start_year, today);
                let request = ReportRequest::monthly(&institution, &years, &months, &canonical)?;
                let outcome = service.generate(&request, today)?;
                deliver(&config, &request, outcome, output)
            }
            Commands::Daily {
                institution,
                from,
                to,
                output,
            } => {
                let request = ReportRequest::daily(&institution, from, to, today)?;
                let outcome = service.generate(&request, today)?;
                deliver(&config, &request, outcome, output)
            }
            Commands::Cumulative {
                institution,
                since,
                json,
            } => {
                let since = since.unwrap_or(config.start_year);
                if since > today.year() {
                    return Err(ReportError::InvalidInput(format!(
                        "--since {} is in the future",
                        since
                    ))
                    .into());
                }
                match service.cumulative(&institution, since, today)? {
                    Some(summary) if json => println!("{}", render::json::cumulative(&summary)?),
                    Some(summary) => print!("{}", render::text::cumulative(&summary)),
                    None if json => println!("{}", render::json::no_data()),
                    None => println!("No usage data for institution {}.", institution.trim()),
                }
                Ok(())
            }
        }
    }
}

/// Print, show or export a finished report
fn deliver(
    config: &Config,
    request: &ReportRequest,
    outcome: ReportOutcome,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let report = match outcome {
        ReportOutcome::Ready(report) => report,
        ReportOutcome::NoData => {
            if output.json {
                println!("{}", render::json::no_data());
            } else {
                print!("{}", render::text::no_data(request));
            }
            return Ok(());
        }
    };

    // export first so a failed write leaves no half-delivered output
    let exported = if output.export {
        let path = WorkbookExporter::new(&config.export.dir)
            .export(&report)
            .with_context(|| format!("failed to export to {}", config.export.dir.display()))?;
        Some(path)
    } else {
        None
    };

    if output.tui {
        tui::run(&report)?;
    } else if output.json {
        println!("{}", render::json::report(&report)?);
    } else {
        print!("{}", render::text::report(&report));
    }

    if let Some(path) = exported {
        // stdout stays pure JSON under --json
        if output.json {
            eprintln!("Exported {} ({})", path.display(), XLSX_MIME);
        } else {
            println!("Exported {} ({})", path.display(), XLSX_MIME);
        }
    }
    Ok(())
}

/// Exit status for a failed run
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ReportError>() {
        Some(e) if e.is_user_error() => EXIT_INVALID_INPUT,
        _ => EXIT_FAILURE,
    }
}

/// Print a failed run to stderr and return its exit status
pub fn report_failure(err: &anyhow::Error) -> i32 {
    let code = exit_code(err);
    if code == EXIT_INVALID_INPUT {
        eprintln!("error: {}", err);
    } else {
        eprintln!("report generation failed: {:#}", err);
    }
    code
}
