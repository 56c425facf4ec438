//! Sweeps leftover acceptance test resources from AWS.
//!
//! ```sh
//! sweeper run --region us-west-2,us-east-1
//! sweeper run --sweep-run aws_auditmanager_assessment --allow-failures
//! sweeper list
//! ```
//!
//! Every flag can also come from the environment or a TOML config file, see
//! [`sweep::SweepConfig`].
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use sweep::{
    aws::{self, SharedClients},
    config::Overrides,
    SweepConfig, SweepReport, SweepStatus,
};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the verbosity level
    #[clap(short, action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run sweepers.
    Run {
        /// Regions to sweep, comma separated.
        #[clap(long = "region", env = "SWEEP_REGIONS", value_delimiter = ',')]
        regions: Vec<String>,

        /// Sweepers to run, comma separated. Defaults to all of them.
        #[clap(long = "sweep-run", env = "SWEEP_RUN", value_delimiter = ',')]
        sweepers: Vec<String>,

        /// Maximum number of deletions in flight per sweep.
        #[clap(long, env = "SWEEP_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Keep sweeping a region after a sweeper fails.
        #[clap(long, env = "SWEEP_ALLOW_FAILURES")]
        allow_failures: bool,

        /// Named AWS profile.
        #[clap(long, env = "AWS_PROFILE")]
        profile: Option<String>,

        /// TOML config file.
        #[clap(long, env = "SWEEP_CONFIG")]
        config: Option<PathBuf>,

        /// Print the report as JSON instead of a table.
        #[clap(long)]
        json: bool,
    },
    /// List registered sweepers and the order they run in.
    List {
        /// Sweepers to schedule, comma separated. Defaults to all of them.
        #[clap(long = "sweep-run", env = "SWEEP_RUN", value_delimiter = ',')]
        sweepers: Vec<String>,
    },
}

fn print_report(report: &SweepReport) {
    for record in report.records.iter() {
        let status = match &record.status {
            SweepStatus::Swept { count } => format!("swept {count}").green(),
            SweepStatus::Skipped { reason } => format!("skipped ({reason})").yellow(),
            SweepStatus::Failed => "failed".red(),
        };
        println!("{:<12} {:<42} {status}", record.region, record.name);
    }
    if !report.errors.is_empty() {
        eprintln!("{}", report.errors.to_string().red());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        verbosity,
        command,
    } = Cli::parse();

    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("sweep", level)
        .filter_module("sweeper", level)
        .parse_default_env()
        .init();

    let sweepers = aws::sweepers();
    match command {
        Command::List { sweepers: filter } => {
            for registration in sweepers.iter() {
                println!("{} - {}", registration.name.bold(), registration.description);
                for dependency in registration.dependencies {
                    println!("    after {dependency}");
                }
            }
            println!();
            for (i, batch) in sweepers.schedule(filter.as_slice())?.iter().enumerate() {
                println!("{} {}", format!("batch {i}:").cyan(), batch.join(", "));
            }
            Ok(())
        }
        Command::Run {
            regions,
            sweepers: filter,
            concurrency,
            allow_failures,
            profile,
            config,
            json,
        } => {
            let config = SweepConfig::read_or_default(config)?.apply(Overrides {
                regions,
                concurrency,
                allow_failures,
                sweepers: filter,
                profile,
            });
            log::debug!("{config:#?}");
            config.clone().install();

            let clients = SharedClients::new(config.profile.clone());
            let report = sweepers
                .run(
                    &config.regions,
                    &clients,
                    config.sweepers.as_slice(),
                    config.allow_failures,
                )
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report.records)?);
            } else {
                print_report(&report);
            }
            anyhow::ensure!(
                report.is_success(),
                "{} sweeper error(s)",
                report.errors.len()
            );
            Ok(())
        }
    }
}
