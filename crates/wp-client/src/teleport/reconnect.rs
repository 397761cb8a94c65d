//! Moving the circuit to the destination simulator

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use wp_core::config::TeleportConfig;
use wp_core::error::ConnectionError;
use wp_core::traits::Network;
use wp_protocol::Message;

use super::notification::FinishInfo;

/// Errors switching to the destination simulator
#[derive(Debug, Error)]
pub enum ReconnectError {
    /// Finish notification lacked part of the destination
    #[error("Teleport finish missing destination {0}")]
    MissingField(&'static str),

    /// No circuit to take the circuit code from
    #[error("No circuit open to hand over")]
    NoCircuit,

    /// Opening the new circuit failed
    #[error("Connecting to destination failed: {0}")]
    Connect(#[source] ConnectionError),

    /// The destination did not come up within the connect timeout
    #[error("Connecting to destination timed out after {0:?}")]
    ConnectTimedOut(Duration),

    /// The new circuit refused the movement confirmation
    #[error("Movement confirmation failed: {0}")]
    Movement(#[source] ConnectionError),
}

/// Hop to the simulator named in a finish notification.
///
/// Reuses the current circuit code and credentials, confirms the movement
/// on the new circuit, then waits `config.settle_interval` so follow-up
/// region data can arrive. Opening the circuit is bounded by
/// `config.connect_timeout`. Returns the endpoint now in use.
pub async fn switch_region<N>(
    network: &N,
    finish: &FinishInfo,
    config: &TeleportConfig,
    use_caps: bool,
) -> Result<SocketAddr, ReconnectError>
where
    N: Network + ?Sized,
{
    let (endpoint, region_handle) = finish.destination()?;
    let circuit = network
        .current_circuit()
        .await
        .ok_or(ReconnectError::NoCircuit)?;

    tracing::debug!(
        "Handing {} over to region {} at {}",
        circuit,
        region_handle,
        endpoint
    );

    tokio::time::timeout(
        config.connect_timeout,
        network.connect(endpoint, circuit.code, use_caps),
    )
    .await
    .map_err(|_| ReconnectError::ConnectTimedOut(config.connect_timeout))?
    .map_err(ReconnectError::Connect)?;

    let credentials = network.credentials();
    network
        .send(Message::complete_agent_movement(
            credentials.agent_id,
            credentials.session_id,
            circuit.code,
        ))
        .await
        .map_err(ReconnectError::Movement)?;

    let connected = network
        .current_circuit()
        .await
        .map(|c| c.endpoint)
        .unwrap_or(endpoint);
    tracing::info!("Connected to new sim {}", connected);

    tokio::time::sleep(config.settle_interval).await;

    Ok(connected)
}
