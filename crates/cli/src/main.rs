//! testwatch CLI - test session monitoring and quality gates.

mod gates;
mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testwatch")]
#[command(about = "Test session monitoring, quality gates and analysis", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a results file through a session and print its reports
    Run {
        /// Results file (JSON)
        #[arg(long)]
        input: PathBuf,
        /// Gate config file (JSON)
        #[arg(long)]
        gates: Option<PathBuf>,
        /// Write the reports here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Cancel the session instead of completing it
        #[arg(long)]
        cancel: bool,
        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: run::OutputFormat,
    },
    /// Inspect the gate configuration
    Gates {
        #[command(subcommand)]
        action: GatesAction,
        /// Gate config file (JSON)
        #[arg(long, global = true)]
        gates: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GatesAction {
    /// List registered gates
    List,
    /// Check the configuration for problems
    Validate,
    /// Print the full configuration
    Export,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { input, gates: gate_config, output, cancel, format } => {
            let engine = gates::load_engine(gate_config.as_deref()).await?;
            let input = run::RunInput::load(&input).await?;
            let outcome = run::execute(input, &engine, cancel, format)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &outcome.report)
                        .await
                        .with_context(|| format!("Failed to write report to {}", path.display()))?;
                    info!("Wrote report to {}", path.display());
                }
                None => println!("{}", outcome.report),
            }

            if outcome.blocks_deployment {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Gates { action, gates: gate_config } => {
            let engine = gates::load_engine(gate_config.as_deref()).await?;
            match action {
                GatesAction::List => println!("{}", gates::list(&engine)),
                GatesAction::Validate => {
                    let (report, valid) = gates::validate(&engine);
                    println!("{}", report);
                    if !valid {
                        return Ok(ExitCode::FAILURE);
                    }
                }
                GatesAction::Export => println!("{}", engine.export_configuration()),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
