//! BatchRun CLI - split work items into bounded batches and run them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use batchrun_core::{BatchPlan, Report};
use batchrun_runtime::Dispatcher;

mod config;
mod error;
mod input;
mod output;
mod shell;

use config::ConfigArgs;
use error::{CliError, EXIT_FAILURES, EXIT_SUCCESS};
use shell::ShellExecutor;

/// BatchRun - run large work-item sets in bounded batches
#[derive(Parser)]
#[command(name = "batchrun")]
#[command(about = "Split work items into bounded batches and run them in parallel", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the batch plan as JSON without running anything
    Plan {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Run a shell command for every item and print the report
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        config: ConfigArgs,

        /// Command to run per item; `{id}` is replaced by the item id
        #[arg(short, long)]
        command: String,

        /// Shell used to run the command
        #[arg(long, default_value = "sh")]
        shell: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Work item ids
    items: Vec<String>,

    /// File with work items, one per line or a JSON array (`-` for stdin)
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match cli.command {
        Commands::Plan { input, config } => plan(input, config),
        Commands::Run {
            input,
            config,
            command,
            shell,
            json,
            output,
        } => run(input, config, command, shell, json, output.as_deref()).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn plan(input: InputArgs, config: ConfigArgs) -> Result<ExitCode, CliError> {
    let config = config.resolve()?;
    let items = input::load_items(input.file.as_deref(), &input.items)?;
    let batches = config.plan_batches(&items)?;

    let plan = BatchPlan::from_batches(&batches);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(ExitCode::from(EXIT_SUCCESS))
}

async fn run(
    input: InputArgs,
    config: ConfigArgs,
    command: String,
    shell: String,
    json: bool,
    report_path: Option<&Path>,
) -> Result<ExitCode, CliError> {
    // Configuration first: nothing runs if it is invalid.
    let config = config.resolve()?;
    let items = input::load_items(input.file.as_deref(), &input.items)?;

    info!(
        items = items.len(),
        max_batch_size = config.max_batch_size,
        peak_concurrency = ?config.peak_concurrency(),
        "Starting BatchRun"
    );

    let executor = Arc::new(ShellExecutor::new(shell, command));
    let dispatcher = Dispatcher::new(executor, config)?;
    let report = dispatcher.run(&items).await?;

    if let Some(path) = report_path {
        write_report(&report, path)?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }

    Ok(exit_code_for(&report))
}

fn write_report(report: &Report, path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| CliError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

fn exit_code_for(report: &Report) -> ExitCode {
    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_FAILURES)
    }
}
