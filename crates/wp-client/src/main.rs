//! Waypoint command-line client
//!
//! Opens a circuit to a simulator with an existing login session and
//! teleports the agent to another region. Useful against a local simulator
//! when working on the handshake.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use wp_client::{CircuitManager, Dispatcher, TeleportController};
use wp_core::config::{self, ClientConfig};
use wp_core::traits::Network;
use wp_core::AgentCredentials;
use wp_protocol::{AgentId, CircuitCode, RegionHandle, SessionId, Vector3};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Waypoint client - teleport an agent between regions")]
#[command(version)]
struct Args {
    /// Simulator the agent is currently on (host:port)
    #[arg(long)]
    sim: SocketAddr,

    /// Circuit code issued at login
    #[arg(long)]
    circuit_code: u32,

    /// Agent UUID issued at login
    #[arg(long)]
    agent_id: Uuid,

    /// Session UUID issued at login
    #[arg(long)]
    session_id: Uuid,

    /// Raw destination region handle
    #[arg(long, conflicts_with_all = ["region_x", "region_y"])]
    region_handle: Option<u64>,

    /// Destination region global X in meters
    #[arg(long, requires = "region_y")]
    region_x: Option<u32>,

    /// Destination region global Y in meters
    #[arg(long, requires = "region_x")]
    region_y: Option<u32>,

    /// Position inside the destination region, as x,y,z
    #[arg(long, value_parser = parse_vector, default_value = "128,128,30")]
    position: Vector3,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_vector(value: &str) -> Result<Vector3, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got {} values", parts.len())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);

    let config: ClientConfig = if config_path.exists() {
        config::load_config(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", config_path, e);
            ClientConfig::default()
        })
    } else {
        ClientConfig::default()
    };

    let region_handle = match (args.region_handle, args.region_x, args.region_y) {
        (Some(handle), _, _) => RegionHandle::new(handle),
        (None, Some(x), Some(y)) => RegionHandle::from_global(x, y),
        _ => anyhow::bail!("Specify --region-handle or both --region-x and --region-y"),
    };

    let credentials = AgentCredentials::new(
        AgentId::new(args.agent_id),
        SessionId::new(args.session_id),
    );

    let dispatcher = Arc::new(Dispatcher::new());
    let network = Arc::new(
        CircuitManager::new(&config.network, credentials, Arc::clone(&dispatcher))
            .context("Failed to set up circuit manager")?,
    );

    network
        .connect(args.sim, CircuitCode(args.circuit_code), config.network.use_caps)
        .await
        .with_context(|| format!("Failed to open circuit to {}", args.sim))?;

    let controller = TeleportController::new(
        Arc::clone(&network),
        &dispatcher,
        config.teleport.clone(),
    )
    .with_use_caps(config.network.use_caps);

    let (succeeded, message): (bool, String) = controller
        .request_teleport(region_handle, args.position)
        .await
        .into();

    network.close().await;

    if succeeded {
        println!("{}", message);
        Ok(())
    } else {
        anyhow::bail!("Teleport to region {} failed: {}", region_handle, message)
    }
}
