use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spinout_common::Config;
use spinout_pipeline::app::{build_pipeline, StoreBackend};
use spinout_pipeline::{CronSchedule, TriggerOutcome};

#[derive(Parser)]
#[command(name = "spinout", about = "Scores university publications for startup potential")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full pass and print the outcome as JSON
    Run {
        /// Keep publications in memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },

    /// Run a pass every time SCHEDULE_CRON fires
    Schedule {
        /// Also run once at startup (overrides RUN_IMMEDIATELY)
        #[arg(long)]
        run_immediately: bool,

        /// Keep publications in memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spinout=info,ai_client=info,warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn backend(in_memory: bool) -> StoreBackend {
    if in_memory {
        StoreBackend::Memory
    } else {
        StoreBackend::Postgres
    }
}

fn print_outcome(outcome: &TriggerOutcome) {
    match serde_json::to_string(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to serialize outcome"),
    }
}

/// Cancel the token on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, finishing current publication");
            token.cancel();
        }
    });
    cancel
}

async fn run_once(in_memory: bool) -> TriggerOutcome {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => return TriggerOutcome::startup_error(e),
    };
    config.log_redacted();

    let pipeline = match build_pipeline(&config, backend(in_memory)).await {
        Ok(pipeline) => pipeline,
        Err(e) => return TriggerOutcome::startup_error(format!("{e:#}")),
    };

    let cancel = cancel_on_ctrl_c();
    let stats = pipeline.run(&cancel).await;
    TriggerOutcome::from_stats(&stats)
}

async fn run_scheduled(run_immediately: bool, in_memory: bool) -> Result<()> {
    let config = Config::from_env()?;
    config.log_redacted();

    let schedule = CronSchedule::parse(&config.schedule_cron)?;
    let pipeline = build_pipeline(&config, backend(in_memory)).await?;
    let cancel = cancel_on_ctrl_c();

    info!(cron = %config.schedule_cron, "Starting scheduler");
    let pipeline = &pipeline;
    let token = &cancel;
    schedule
        .run(run_immediately || config.run_immediately, &cancel, move || async move {
            let stats = pipeline.run(token).await;
            print_outcome(&TriggerOutcome::from_stats(&stats));
        })
        .await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Run { in_memory } => {
            let outcome = run_once(in_memory).await;
            print_outcome(&outcome);
            if outcome.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Schedule {
            run_immediately,
            in_memory,
        } => match run_scheduled(run_immediately, in_memory).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Scheduler failed to start: {e:#}");
                print_outcome(&TriggerOutcome::startup_error(format!("{e:#}")));
                ExitCode::FAILURE
            }
        },
    }
}
