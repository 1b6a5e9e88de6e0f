//! # ekflog
//!
//! Command-line front end for EKF sensor logs: convert between the binary
//! and text formats, check a log for dropped records, dump it as JSON Lines,
//! or generate a synthetic test scenario.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use ekflog::config::{Config, LoggingConfig};
use ekflog::scenario::{Scenario, DEFAULT_TIMESPAN_US};
use ekflog::{FormatRouter, StreamIntegrity};

#[derive(Parser, Debug)]
#[command(name = "ekflog", version, about = "EKF sensor log tool")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a log between formats, picked by file extension.
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
    /// Print record counts and dropped-record totals.
    Stats {
        file: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print every record as one JSON object per line.
    Dump {
        file: PathBuf,
    },
    /// Write a constant-data test scenario.
    Generate {
        output: PathBuf,
        /// Scenario length in microseconds.
        #[arg(long, default_value_t = DEFAULT_TIMESPAN_US)]
        timespan_us: u64,
    },
}

/// Set up the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// flushes the background writer when dropped.
fn init_logging(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logging.level.to_lowercase()))
        .context("invalid log level")?;

    let (writer, guard) = match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file {} has no file name", file))?;
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(logging.file.is_none())
        .init();

    Ok(guard)
}

fn run(command: Command, router: &FormatRouter) -> Result<()> {
    match command {
        Command::Convert { input, output } => {
            let written = router
                .convert(&input, &output)
                .with_context(|| format!("converting {} to {}", input.display(), output.display()))?;
            info!("Converted {} records", written);
        }

        Command::Stats { file, json } => {
            let records = router
                .decode(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let report = StreamIntegrity::new(&records).report();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("records:       {}", report.records);
                if let (Some(first), Some(last)) = (report.first_id, report.last_id) {
                    println!("ids:           {}..={}", first, last);
                }
                println!("total missing: {}", report.total_missing);
                for (kind, count) in &report.kinds {
                    println!("  {:<12}{}", kind.label(), count);
                }
            }
        }

        Command::Dump { file } => {
            let records = router
                .decode(&file)
                .with_context(|| format!("reading {}", file.display()))?;

            let mut out = BufWriter::new(io::stdout().lock());
            for record in &records {
                serde_json::to_writer(&mut out, record)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }

        Command::Generate { output, timespan_us } => {
            let records = Scenario::default().records(timespan_us)?;
            let written = router
                .encode(&output, records)
                .with_context(|| format!("writing {}", output.display()))?;
            info!("Generated {} records over {} us", written, timespan_us);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let _guard = init_logging(&config.logging)?;
    info!("ekflog v{} starting...", env!("CARGO_PKG_VERSION"));

    let router = FormatRouter::from_config(&config)?;
    run(cli.command, &router)
}
