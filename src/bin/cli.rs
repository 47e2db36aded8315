//! Trend Retriever CLI
//!
//! Runs the retrieval job once at startup and then on a fixed interval until
//! interrupted with Ctrl+C (or SIGTERM on Unix).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use trend_retriever::{
    error::{AppError, Result},
    models::{Config, SchedulerConfig},
    pipeline::{self, Job, Scheduler, StopReason, TrendJob},
    storage::{JsonFileStorage, TrendStorage},
};

/// Trend Retriever - periodic trending topic collector
#[derive(Parser, Debug)]
#[command(name = "trend-retriever", version, about = "Periodic trending topic collector")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run at startup, then on a fixed interval until interrupted (default)
    Run {
        /// Override the scheduler interval
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Run a single cycle and exit
    Once,

    /// Validate the configuration
    Validate,

    /// Show the last saved batch
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn warn_if_invalid(config: &Config) {
    if let Err(e) = config.validate() {
        log::warn!("{e}. Affected cycles will yield no trends.");
    }
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Trend Retriever starting...");

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::info!(
        "Loaded configuration from {} (fetch_method = {})",
        cli.config.display(),
        config.retrieval.fetch_method
    );

    match cli.command.unwrap_or(Command::Run {
        interval_secs: None,
    }) {
        Command::Run { interval_secs } => {
            if let Some(secs) = interval_secs {
                config.scheduler.interval_secs = secs;
            }
            warn_if_invalid(&config);

            let mut interval_secs = config.scheduler.interval_secs;
            if interval_secs == 0 {
                interval_secs = SchedulerConfig::default().interval_secs;
                log::warn!("Interval of 0s is not allowed, using {interval_secs}s");
            }

            let job = TrendJob::from_config(&config);
            let mut scheduler = Scheduler::new(Duration::from_secs(interval_secs));

            match scheduler.run(&job, pipeline::shutdown_signal()).await {
                StopReason::Interrupted => {}
                StopReason::Fault(message) => return Err(AppError::Scheduler(message)),
            }
        }

        Command::Once => {
            warn_if_invalid(&config);

            let job = TrendJob::from_config(&config);
            let report = job.run().await;
            log::info!(
                "Cycle complete: {} trend(s), persisted: {}",
                report.fetched,
                report.persisted
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let storage = JsonFileStorage::new(&config.output.path);
            log::info!("Output file: {}", storage.path().display());

            if !storage.path().exists() {
                log::info!("No batch saved yet.");
                return Ok(());
            }

            let modified = std::fs::metadata(storage.path())?.modified()?;
            let modified: chrono::DateTime<chrono::Local> = modified.into();
            log::info!("Last updated: {}", modified.format("%Y-%m-%d %H:%M:%S"));

            let batch = storage.load().await?;
            log::info!("Saved trends: {}", batch.len());
            for (i, record) in batch.iter().enumerate() {
                log::info!("  {}. {}", i + 1, record.title);
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
