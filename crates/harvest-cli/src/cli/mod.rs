//! CLI for the harvest conversion fetcher.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use harvest_core::config;

use commands::{run_harvest, run_status, run_stop};

/// Top-level CLI for harvest.
#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest: partitioned, self-rebalancing conversion report fetcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch every conversion in [FROM, TO) and store it.
    Run {
        /// Window start, e.g. 2017-02-13T00:00:00.
        #[arg(long, value_name = "TIME")]
        from: String,
        /// Window end (exclusive), same format as --from.
        #[arg(long, value_name = "TIME")]
        to: String,
        /// Number of workers (defaults to `workers` in the config file).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Keep records in memory instead of writing the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show worker progress of a running harvest.
    Status,

    /// Stop every worker of a running harvest after its current page.
    Stop,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                from,
                to,
                workers,
                dry_run,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_harvest(&cfg, &from, &to, workers, dry_run).await?;
            }
            CliCommand::Status => run_status().await?,
            CliCommand::Stop => run_stop().await?,
        }

        Ok(())
    }
}
