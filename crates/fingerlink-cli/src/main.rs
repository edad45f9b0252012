//! Fingerlink node simulator.
//!
//! Runs the full node against simulated peripherals (sensor, button, link),
//! a log-backed display and a real HTTP reporting client. Peripheral events
//! and command messages are read from stdin, one per line; see [`sim`].
//!
//! A restart request rebuilds the node on the same simulated hardware, the
//! way the device reboots.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fingerlink_hardware::LogNotifier;
use fingerlink_network::ReqwestTransport;
use fingerlink_node::{Node, NodeConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod sim;

use sim::{Action, Simulation};

#[derive(Parser)]
#[command(name = "fingerlink")]
#[command(about = "Fingerprint access-control node (simulated peripherals)", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reporting server, overrides `endpoints.base_url`
    #[arg(long)]
    base_url: Option<String>,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info,fingerlink=debug")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli)?;
    info!(
        base_url = %config.endpoints.base_url,
        topics = ?config.topics.all(),
        "Configuration loaded"
    );

    let transport =
        ReqwestTransport::new(config.endpoints.clone()).context("Failed to build HTTP client")?;
    let sim = Simulation::new();
    let notifier = std::sync::Arc::new(LogNotifier::new());

    let mut input = Box::pin(read_input(&sim));
    let mut generation = 0u32;

    loop {
        generation += 1;
        let (sensor, button, link, commands) = sim.devices();
        let node = Node::builder()
            .sensor(sensor)
            .button(button)
            .link(link)
            .shared_notifier(std::sync::Arc::clone(&notifier))
            .transport(transport.clone())
            .commands(commands)
            .config(config.clone())
            .build()?;

        info!(generation, "Booting node");
        tokio::select! {
            result = node.run() => {
                let reason = result.context("Node stopped")?;
                warn!(%reason, generation, "Rebooting node");
            }
            () = &mut input => {
                info!("Input closed, shutting down");
                return Ok(());
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => NodeConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.endpoints.base_url = base_url.clone();
        config.validate().context("Invalid --base-url")?;
    }

    Ok(config)
}

/// Feed stdin lines to the simulation until EOF.
async fn read_input(sim: &Simulation) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match Action::parse(&line) {
                Ok(Some(action)) => sim.apply(action).await,
                Ok(None) => {}
                Err(e) => warn!("{e}"),
            },
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                return;
            }
        }
    }
}
