//! Credit Risk Pipeline - Main Entry Point
//!
//! Runs the pipeline stages (explore, prepare, train, evaluate) and the
//! scoring service from one binary. Stages communicate only through files on
//! disk, so each subcommand can run in a fresh process.

use anyhow::Result;
use clap::{Parser, Subcommand};
use credit_risk_pipeline::config::AppConfig;
use credit_risk_pipeline::{evaluate, explore, prepare, service, train};
use tracing::info;

#[derive(Parser)]
#[command(name = "credit-risk-pipeline", version, about = "Credit default risk pipeline")]
struct Cli {
    /// Path to a TOML configuration file overriding the defaults.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize the raw datasets: dimensions, class balance, bureau history.
    Explore,
    /// Aggregate bureau history and build the master table.
    Prepare,
    /// Train the model and persist the artifact triple.
    Train,
    /// Evaluate the persisted model on the held-out partition.
    Evaluate,
    /// Serve the scoring API.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("credit_risk_pipeline=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    info!("Configuration loaded successfully");

    match cli.command {
        Command::Explore => {
            let report = explore::run(&config)?;
            println!("{report}");
        }
        Command::Prepare => {
            let master = prepare::run(&config)?;
            info!(
                rows = master.n_rows(),
                cols = master.n_cols(),
                "preparation finished"
            );
        }
        Command::Train => {
            let artifacts = train::run(&config)?;
            match artifacts.metadata.test_auc {
                Some(auc) => info!(auc = format!("{auc:.4}"), "training finished"),
                None => info!("training finished"),
            }
        }
        Command::Evaluate => {
            let report = evaluate::run(&config)?;
            println!("{report}");
        }
        Command::Serve => {
            service::serve(&config).await?;
        }
    }

    Ok(())
}
