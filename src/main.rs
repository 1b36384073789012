//! Command-line entry point for icon-press.
//!
//! Loads the YAML config, then either lists the planned tasks (`--dry-run`)
//! or converts every icon and prints a summary. Failed icons are reported
//! but do not change the exit status; an invalid config does.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use icon_press::{Config, Converter, ExecutionMode, LogSettings, VERSION, plan};

#[derive(Debug, Parser)]
#[command(name = "icon-press", version, about = "Convert SVG icons into square and wide PNGs")]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "icons.yaml")]
    config: PathBuf,

    /// Log every converted file and debug detail
    #[arg(short, long)]
    verbose: bool,

    /// Run tasks in concurrent batches instead of one at a time
    #[arg(short, long)]
    parallel: bool,

    /// Fetch every source again instead of reusing earlier downloads
    #[arg(long)]
    no_cache: bool,

    /// Print the planned tasks without converting anything
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the config file JSON schema and exit
    #[cfg(feature = "jsonschema")]
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log = LogSettings::new(cli.verbose);
    log.init();

    match run(cli, log).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, log: LogSettings) -> Result<()> {
    #[cfg(feature = "jsonschema")]
    if cli.print_schema {
        println!("{}", Config::json_schema()?);
        return Ok(());
    }

    tracing::debug!("icon-press v{VERSION}");

    let config = Config::load(&cli.config)
        .with_context(|| format!("cannot use config {}", cli.config.display()))?;

    if cli.dry_run {
        for task in plan(&config) {
            let canvas = task.parameters.canvas;
            println!(
                "{:<6} {}x{:<5} {} -> {}",
                task.kind,
                canvas.width,
                canvas.height,
                task.source,
                task.output_path.display()
            );
        }
        return Ok(());
    }

    let mode = if cli.parallel {
        ExecutionMode::Batched
    } else {
        ExecutionMode::Sequential
    };

    let converter = Converter::new(log)
        .context("failed to set up HTTP client")?
        .with_cache(!cli.no_cache);
    let summary = converter
        .run(&config, mode)
        .await
        .context("conversion aborted")?;

    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{summary}");
    }

    if summary.failed > 0 {
        tracing::warn!("{} of {} tasks failed", summary.failed, summary.total);
    }
    Ok(())
}
