//! CLI entry point for the GRT snapshot aggregator.
//!
//! Provides subcommands for producing a single snapshot, polling on an
//! interval, and inspecting an individual feed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grt_snapshot::{
    aggregator::Aggregator,
    config::Config,
    fetch::{BasicClient, FeedHeaders, fetch_bytes},
    output::{print_json, print_pretty, to_json, write_snapshot},
    parser::decode_entities,
    summary::{FeedCounts, SnapshotSummary},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grt_snapshot")]
#[command(about = "Aggregates GRT realtime feeds into a single snapshot", long_about = None)]
struct Cli {
    /// JSON config file with feed paths and fetch settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    /// Override the upstream base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation cycle and print or save the snapshot
    Snapshot {
        /// Write the snapshot to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print JSON on stdout
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Run aggregation cycles on an interval, replacing the output file each time
    Poll {
        /// File that always holds the latest snapshot
        #[arg(short, long, default_value = "snapshot.json")]
        output: String,

        /// Seconds between cycles
        #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Number of cycles to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_samples: usize,
    },
    /// Decode a single GTFS-RT feed from a file or URL and report its contents
    Inspect {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grt_snapshot.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grt_snapshot.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.base_url)?;

    match cli.command {
        Commands::Snapshot { output, pretty } => {
            let aggregator = Aggregator::new(config)?;
            let snapshot = aggregator.get_unified_snapshot().await?;
            print_pretty(&SnapshotSummary::from_snapshot(&snapshot));

            match output {
                Some(path) => {
                    write_snapshot(&path, &snapshot)?;
                    info!(path, "Snapshot saved");
                }
                None => println!("{}", to_json(&snapshot, pretty)?),
            }
        }
        Commands::Poll {
            output,
            interval,
            num_samples,
        } => {
            let aggregator = Aggregator::new(config)?;
            poll(&aggregator, &output, interval, num_samples).await?;
        }
        Commands::Inspect { source } => {
            let bytes = fetcher(&source, &config).await?;
            let entities = decode_entities(&bytes)
                .with_context(|| format!("Failed to decode feed from {source}"))?;
            let counts = FeedCounts::from_entities(&entities, &config.rail_route_id);
            info!("{}", serde_json::to_string_pretty(&counts)?);
        }
    }

    Ok(())
}

/// Resolves configuration: defaults or `--config` file, then `GRT_*` env vars,
/// then `--base-url`.
fn load_config(path: Option<&str>, base_url: Option<String>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_env()?;

    if let Some(url) = base_url {
        config.base_url = url;
    }
    config.validate()?;

    info!(base_url = %config.base_url, timeout_secs = config.timeout_secs, "Configuration loaded");
    Ok(config)
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(config))]
async fn fetcher(source: &str, config: &Config) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = FeedHeaders::new(BasicClient::new()?, &config.user_agent)?;
        fetch_bytes(&client, source, config.timeout()).await?.to_vec()
    } else {
        std::fs::read(source).with_context(|| format!("Failed to read {source}"))?
    };
    Ok(bytes)
}

/// Runs aggregation cycles every `interval` seconds. A failed cycle is logged
/// and the previous snapshot file is left in place until the next success.
#[tracing::instrument(skip(aggregator))]
async fn poll(
    aggregator: &Aggregator,
    output: &str,
    interval: u64,
    num_samples: usize,
) -> Result<()> {
    if num_samples == 0 {
        info!(interval, "Polling indefinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, interval, "Starting polling");
    }

    let mut cycle = 0;

    loop {
        if num_samples > 0 && cycle >= num_samples {
            break;
        }
        cycle += 1;

        let started = std::time::Instant::now();
        match aggregator.get_unified_snapshot().await {
            Ok(snapshot) => {
                let summary = SnapshotSummary::from_snapshot(&snapshot);
                if let Err(e) = write_snapshot(output, &snapshot) {
                    error!(error = %e, "Failed to write snapshot");
                } else {
                    print_json(&summary)?;
                    info!(
                        cycle,
                        delayed = summary.delayed,
                        delayed_pct = format!("{:.1}", summary.delayed_pct()),
                        "Cycle complete"
                    );
                }
                if started.elapsed().as_secs() > interval {
                    warn!(
                        elapsed_secs = started.elapsed().as_secs(),
                        "Cycle took longer than the polling interval"
                    );
                }
            }
            Err(e) => error!(error = %e, cycle, "Aggregation cycle failed, retrying next interval"),
        }

        if num_samples == 0 || cycle < num_samples {
            tokio::select! {
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(interval)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    break;
                }
            }
        }
    }

    info!(cycles = cycle, output, "Finished polling");
    Ok(())
}
