use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod analyzer;
mod calendar;
mod config;
mod error;
mod loader;
mod metrics;
mod models;
mod report;
mod session;
mod stats;

use calendar::CampaignCalendar;
use config::{AnalyzerConfig, CohortSource, DenominatorChoice};
use models::{Filter, Selection};
use session::Session;

#[derive(Parser)]
#[command(name = "campaign-window-analyzer")]
#[command(about = "Test vs Control performance analyzer for campaign windows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    #[arg(long)]
    csv: PathBuf,
    /// Cohort to analyze, or "All"
    #[arg(long, default_value = "All")]
    cohort: String,
    /// Recency value to analyze, or "All"
    #[arg(long, default_value = "All")]
    recency: String,
    #[arg(long, value_enum, default_value_t = DenominatorChoice::Auto)]
    denominator: DenominatorChoice,
}

impl AnalysisArgs {
    fn selection(&self) -> Selection {
        Selection {
            cohort: Filter::from(self.cohort.as_str()),
            recency: Filter::from(self.recency.as_str()),
        }
    }

    fn open_session(&self) -> anyhow::Result<Session> {
        let config = AnalyzerConfig {
            denominator: self.denominator,
            ..AnalyzerConfig::default()
        };
        Session::open(&self.csv, config)
            .with_context(|| format!("failed to load {}", self.csv.display()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the test and pre-test windows for a cohort
    Window {
        #[arg(long, default_value = "All")]
        cohort: String,
    },
    /// List the cohort and recency values available for selection
    Filters {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum, default_value_t = CohortSource::Data)]
        cohort_source: CohortSource,
        #[arg(long, value_enum, default_value_t = DenominatorChoice::Auto)]
        denominator: DenominatorChoice,
    },
    /// Compare pre-test and test periods and print the results
    Analyze {
        #[command(flatten)]
        args: AnalysisArgs,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        args: AnalysisArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Window { cohort } => {
            let calendar = CampaignCalendar::embedded()?;
            let cohort = Filter::from(cohort.as_str());
            let window = calendar
                .window(&cohort)
                .with_context(|| format!("cannot derive a window for {cohort}"))?;
            println!(
                "Test Period: {} to {} ({} days)",
                window.test_start, window.test_end, window.test_length
            );
            println!(
                "Pre-Test Period: {} to {}",
                window.pre_test_start, window.pre_test_end
            );
        }
        Commands::Filters {
            csv,
            cohort_source,
            denominator,
        } => {
            let config = AnalyzerConfig {
                denominator,
                cohort_source,
            };
            let session = Session::open(&csv, config)
                .with_context(|| format!("failed to load {}", csv.display()))?;
            session.run(|session| {
                println!("Cohorts: All, {}", session.cohorts().join(", "));
                println!("Recency: All, {}", session.recencies().join(", "));
                let uncalendared = session.uncalendared_cohorts();
                if !uncalendared.is_empty() {
                    println!(
                        "No campaign dates for: {} (selecting these will fail)",
                        uncalendared.join(", ")
                    );
                }
                anyhow::Ok(())
            })?;
        }
        Commands::Analyze { args, json } => {
            let selection = args.selection();
            args.open_session()?.run(|session| {
                let analysis = session.analyze(&selection)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&analysis)?);
                } else {
                    print!("{}", report::build_text(&analysis));
                }
                anyhow::Ok(())
            })?;
        }
        Commands::Report { args, out } => {
            let selection = args.selection();
            args.open_session()?.run(|session| {
                let analysis = session.analyze(&selection)?;
                std::fs::write(&out, report::build_report(&analysis))
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Report written to {}.", out.display());
                anyhow::Ok(())
            })?;
        }
    }

    Ok(())
}
