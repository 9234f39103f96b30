//! # gatt-measure
//!
//! Decode Bluetooth GATT cycling power and running speed/cadence measurements
//! from a stream of hex-encoded characteristic values.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gatt_measure::config::{Config, LoggingConfig};
use gatt_measure::stream::process_stream;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "gatt-measure", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input file of `<characteristic> <hex payload>` lines (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

/// Main entry point for gatt-measure
///
/// Reads characteristic values line by line and writes one telemetry line per
/// decoded sample to stdout.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when no file is given)
///    - Set up logging to stderr, plus a rolling file when `log_dir` is set
///
/// 2. **Main Loop**
///    - Decode each input line and write its telemetry record
///    - Stop at end of input or on Ctrl+C
///
/// 3. **Shutdown**
///    - Log decoded/rejected counts
///
/// # Errors
///
/// Returns error if the configuration or input file cannot be read, or
/// writing to stdout fails.
///
/// # Examples
///
/// ```bash
/// echo "cycling_power 00 00 2c 01" | cargo run --release
/// ```
///
/// Expected output:
/// ```text
/// {"timestamp":"...","characteristic":"cycling_power","measurement":{...,"total_instantaneous_power":300,...}}
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let guard = init_logging(&config.logging)?;

    info!("gatt-measure v{} starting...", env!("CARGO_PKG_VERSION"));

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            info!("Reading payloads from {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => {
            info!("Reading payloads from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    let mut stdout = tokio::io::stdout();

    let interrupted = tokio::select! {
        stats = process_stream(reader, &mut stdout, &config) => {
            let stats = stats?;
            info!(
                "Finished: {} lines, {} decoded, {} rejected",
                stats.lines, stats.decoded, stats.rejected
            );
            false
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            true
        }
    };

    if interrupted {
        stdout.flush().await?;
        // A pending stdin read occupies a blocking-pool thread that the
        // runtime would wait on when dropped, so exit without dropping it.
        drop(guard);
        std::process::exit(0);
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must stay alive for file logs to be flushed.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid logging level")?;

    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = if logging.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&logging.log_dir, &logging.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["gatt-measure"]);
        assert!(args.config.is_none());
        assert!(args.input.is_none());
    }

    #[test]
    fn test_args_paths() {
        let args = Args::parse_from([
            "gatt-measure",
            "--config",
            "config/default.toml",
            "-i",
            "capture.txt",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("config/default.toml")));
        assert_eq!(args.input, Some(PathBuf::from("capture.txt")));
    }

    #[test]
    fn test_args_verify() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
