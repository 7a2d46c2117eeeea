//! tailcast - follow a file and print line batches as JSON
//!
//! Each batch is written to stdout as one `{"type": .., "data": [..]}` message,
//! the same shape a push transport relays to its subscribers.

use anyhow::Result;
use clap::{value_parser, Arg, ArgMatches, Command};
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tailcast::{Batch, TailConfig, TailEngine, TailError};
use tokio::sync::broadcast;

/// Buffered batches per subscriber before it starts lagging
const SUBSCRIBER_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, controlled by RUST_LOG
    env_logger::init();

    let matches = cli().get_matches();
    let config = build_config(&matches)?;

    let (batch_tx, batch_rx) = broadcast::channel::<Batch>(SUBSCRIBER_BUFFER);
    let printer = tokio::spawn(print_batches(batch_rx));

    let engine = TailEngine::open(config)?.with_sink(batch_tx);
    let handle = engine.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("interrupted, shutting down");
    handle.shutdown().await?;
    printer.await?;

    Ok(())
}

fn cli() -> Command {
    let command = Command::new("tailcast")
        .version(tailcast::VERSION)
        .about("Follow a growing file and stream new lines as JSON batches")
        .long_about(
            "tailcast prints the last lines of a file as an init batch, then polls \
             the file and prints every group of appended lines as an update batch. \
             Truncated or rotated files produce a fresh init batch.",
        )
        .arg(
            Arg::new("file")
                .help("Path to the file to follow")
                .index(1),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .help("Polling interval in milliseconds [default: 1000]")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("lines")
                .short('n')
                .long("lines")
                .help("Number of recent lines to keep and replay [default: 10]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .help("Bytes per read chunk [default: 65536]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("read-timeout-ms")
                .long("read-timeout-ms")
                .help("Upper bound on a single read in milliseconds [default: 5000]")
                .value_parser(value_parser!(u64)),
        );

    #[cfg(feature = "config")]
    let command = command.arg(
        Arg::new("config")
            .short('c')
            .long("config")
            .help("TOML config file (defaults to <config dir>/tailcast/config.toml when present)"),
    );

    command
}

fn build_config(matches: &ArgMatches) -> Result<TailConfig> {
    let file = matches.get_one::<String>("file").map(PathBuf::from);

    #[cfg(feature = "config")]
    let mut config = {
        let config_path = matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .or_else(|| tailcast::config::default_config_path().filter(|p| p.is_file()));
        match config_path {
            Some(path) => tailcast::config::ConfigFile::load(&path)?.into_config(file)?,
            None => TailConfig::new(file.ok_or_else(missing_file)?),
        }
    };

    #[cfg(not(feature = "config"))]
    let mut config = TailConfig::new(file.ok_or_else(missing_file)?);

    if let Some(ms) = matches.get_one::<u64>("interval-ms") {
        config.poll_interval = Duration::from_millis(*ms);
    }
    if let Some(lines) = matches.get_one::<usize>("lines") {
        config.max_lines = *lines;
    }
    if let Some(chunk_size) = matches.get_one::<usize>("chunk-size") {
        config.chunk_size = *chunk_size;
    }
    if let Some(ms) = matches.get_one::<u64>("read-timeout-ms") {
        config.read_timeout = Duration::from_millis(*ms);
    }

    config.validate()?;
    Ok(config)
}

fn missing_file() -> TailError {
    TailError::invalid_argument("a file to follow is required")
}

/// Stand-in subscriber: print every batch as one JSON line
async fn print_batches(mut rx: broadcast::Receiver<Batch>) {
    let stdout = std::io::stdout();
    loop {
        match rx.recv().await {
            Ok(batch) => match batch.to_json() {
                Ok(json) => {
                    let mut out = stdout.lock();
                    if writeln!(out, "{json}").and_then(|_| out.flush()).is_err() {
                        break;
                    }
                }
                Err(err) => warn!("{err}"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("stdout fell behind, skipped {skipped} batches");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!tailcast::VERSION.is_empty());
    }

    #[test]
    fn test_cli_overrides() {
        let matches = cli().get_matches_from([
            "tailcast",
            "app.log",
            "--interval-ms",
            "250",
            "-n",
            "20",
        ]);
        let config = build_config(&matches).unwrap();
        assert_eq!(config.path, PathBuf::from("app.log"));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_lines, 20);
        assert_eq!(config.chunk_size, tailcast::config::DEFAULT_CHUNK_SIZE);
    }

    #[cfg(not(feature = "config"))]
    #[test]
    fn test_cli_requires_file_argument() {
        let matches = cli().get_matches_from(["tailcast", "--lines", "5"]);
        let err = build_config(&matches).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TailError>(),
            Some(TailError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_cli_rejects_zero_lines() {
        let matches = cli().get_matches_from(["tailcast", "app.log", "--lines", "0"]);
        assert!(build_config(&matches).is_err());
    }
}
