//! Network traits

use async_trait::async_trait;
use std::net::SocketAddr;

use crate::error::ConnectionError;
use crate::types::{AgentCredentials, CircuitInfo};
use wp_protocol::{CircuitCode, Message};

/// Abstraction over the client's circuit to its current simulator.
///
/// Inbound traffic is not part of this trait: implementations push decoded
/// messages into a dispatcher, and consumers subscribe there.
#[async_trait]
pub trait Network: Send + Sync {
    /// Credentials of the logged-in agent
    fn credentials(&self) -> AgentCredentials;

    /// The circuit currently open, if any
    async fn current_circuit(&self) -> Option<CircuitInfo>;

    /// Send a message on the current circuit
    async fn send(&self, message: Message) -> Result<(), ConnectionError>;

    /// Replace the current circuit with one to `endpoint`.
    ///
    /// `use_caps` asks the implementation to keep capability-based services
    /// bound to the new simulator as well. Teleport hand-over wraps this call
    /// in its connect timeout; the handshake deadline is not checked while
    /// it runs.
    async fn connect(
        &self,
        endpoint: SocketAddr,
        circuit_code: CircuitCode,
        use_caps: bool,
    ) -> Result<(), ConnectionError>;
}
