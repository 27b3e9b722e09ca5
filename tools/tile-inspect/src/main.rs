//! gas-tile-inspect
//!
//! Reads a Node snapshot (and optionally a Pod snapshot) as JSON, the way
//! `kubectl get -o json` prints them, and prints the tile, PCI-group and
//! request view the scheduler extender would resolve for them.
//!
//! ```text
//! kubectl get node worker-0 -o json > node.json
//! gas-tile-inspect --node node.json --card card1 --pretty
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use k8s_openapi::api::core::v1::{Node, Pod};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod report;

use config::{Config, LogFormat};
use report::{NodeReport, PodReport, Report};

#[derive(Debug, Parser)]
#[command(name = "gas-tile-inspect", about = "Show the resolved GPU tile view of a node and pod")]
struct Args {
    /// Node JSON snapshot.
    #[arg(long)]
    node: PathBuf,

    /// Pod JSON snapshot.
    #[arg(long)]
    pod: Option<PathBuf>,

    /// Card to resolve the PCI group for (e.g. card1).
    #[arg(long)]
    card: Option<String>,

    /// Tiles per GPU, overriding GAS_TILES_PER_GPU and the node capacity.
    #[arg(long)]
    tiles_per_gpu: Option<u32>,

    /// Log level, overriding GAS_LOG_LEVEL.
    #[arg(long)]
    log_level: Option<String>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON: {}", path.display()))
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout carries only the report.
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(level) = args.log_level.clone() {
        config.log_level = level;
    }
    if args.tiles_per_gpu.is_some() {
        config.tiles_per_gpu = args.tiles_per_gpu;
    }

    init_tracing(&config);

    let node: Node = read_json(&args.node)?;
    info!(path = %args.node.display(), "Loaded node snapshot");

    let pod: Option<Pod> = args.pod.as_deref().map(read_json::<Pod>).transpose()?;

    let report = Report {
        node: NodeReport::resolve(&node, config.tiles_per_gpu, args.card.as_deref()),
        pod: pod.as_ref().map(PodReport::resolve),
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize report")?;

    println!("{output}");
    Ok(())
}
