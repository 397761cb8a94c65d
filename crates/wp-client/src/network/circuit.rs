//! UDP circuit to the current region simulator
//!
//! A circuit is a connected UDP socket plus a pump task that decodes
//! inbound datagrams and hands them to the [`Dispatcher`]. Switching
//! simulators opens the new circuit first and only then tears the old one
//! down, so a failed hop leaves the agent where it was.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::codec::{Decoder, Encoder};

use wp_core::config::NetworkConfig;
use wp_core::error::ConnectionError;
use wp_core::traits::Network;
use wp_core::{AgentCredentials, CircuitInfo, WpError};
use wp_protocol::{CircuitCode, Frame, FrameCodec, Message};

use crate::dispatch::Dispatcher;

/// Receive buffer size; one frame per datagram, bounded by the UDP limit
const MAX_DATAGRAM_SIZE: usize = 65_536;

/// An open circuit and its receive pump
struct ActiveCircuit {
    info: CircuitInfo,
    socket: Arc<UdpSocket>,
    use_caps: bool,
    pump: JoinHandle<()>,
}

/// Owns the client's circuit and implements [`Network`] over UDP
pub struct CircuitManager {
    credentials: AgentCredentials,
    bind_address: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    circuit: RwLock<Option<ActiveCircuit>>,
    sequence: AtomicU32,
}

impl CircuitManager {
    /// Create a manager with no circuit open
    pub fn new(
        config: &NetworkConfig,
        credentials: AgentCredentials,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self, WpError> {
        let bind_address = config.bind_socket_addr()?;

        Ok(Self {
            credentials,
            bind_address,
            dispatcher,
            circuit: RwLock::new(None),
            sequence: AtomicU32::new(1),
        })
    }

    /// Local address of the open circuit
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.circuit
            .read()
            .await
            .as_ref()
            .and_then(|c| c.socket.local_addr().ok())
    }

    /// Whether the open circuit keeps capability services bound
    pub async fn caps_enabled(&self) -> bool {
        self.circuit
            .read()
            .await
            .as_ref()
            .map(|c| c.use_caps)
            .unwrap_or(false)
    }

    /// Tear down the open circuit, if any
    pub async fn close(&self) {
        if let Some(circuit) = self.circuit.write().await.take() {
            circuit.pump.abort();
            tracing::info!("Closed circuit {}", circuit.info);
        }
    }

    /// Bind a socket to `endpoint` and announce the circuit code on it
    async fn open(
        &self,
        endpoint: SocketAddr,
        code: CircuitCode,
        use_caps: bool,
    ) -> Result<ActiveCircuit, ConnectionError> {
        let connect_failed = |e: std::io::Error| ConnectionError::ConnectFailed {
            endpoint,
            reason: e.to_string(),
        };

        let socket = UdpSocket::bind(self.bind_address)
            .await
            .map_err(connect_failed)?;
        socket.connect(endpoint).await.map_err(connect_failed)?;
        let socket = Arc::new(socket);

        self.sequence.store(1, Ordering::Relaxed);
        self.send_on(
            &socket,
            Message::UseCircuitCode {
                code,
                session_id: self.credentials.session_id,
                agent_id: self.credentials.agent_id,
            },
        )
        .await?;

        let info = CircuitInfo { code, endpoint };
        let pump = tokio::spawn(run_pump(
            Arc::clone(&socket),
            Arc::clone(&self.dispatcher),
            info,
        ));

        Ok(ActiveCircuit {
            info,
            socket,
            use_caps,
            pump,
        })
    }

    async fn send_on(&self, socket: &UdpSocket, message: Message) -> Result<(), ConnectionError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut buf = BytesMut::new();
        FrameCodec::new().encode(Frame::new(sequence, message), &mut buf)?;

        socket
            .send(&buf)
            .await
            .map_err(|e| ConnectionError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Network for CircuitManager {
    fn credentials(&self) -> AgentCredentials {
        self.credentials
    }

    async fn current_circuit(&self) -> Option<CircuitInfo> {
        self.circuit.read().await.as_ref().map(|c| c.info)
    }

    async fn send(&self, message: Message) -> Result<(), ConnectionError> {
        let socket = self
            .circuit
            .read()
            .await
            .as_ref()
            .map(|c| Arc::clone(&c.socket))
            .ok_or(ConnectionError::NotConnected)?;

        self.send_on(&socket, message).await
    }

    async fn connect(
        &self,
        endpoint: SocketAddr,
        circuit_code: CircuitCode,
        use_caps: bool,
    ) -> Result<(), ConnectionError> {
        tracing::debug!("Opening circuit to {}", endpoint);
        let circuit = self.open(endpoint, circuit_code, use_caps).await?;
        let info = circuit.info;

        if let Some(previous) = self.circuit.write().await.replace(circuit) {
            previous.pump.abort();
            tracing::debug!("Closed circuit {}", previous.info);
        }

        tracing::info!("Circuit {} open", info);
        Ok(())
    }
}

impl Drop for CircuitManager {
    fn drop(&mut self) {
        if let Some(circuit) = self.circuit.get_mut().take() {
            circuit.pump.abort();
        }
    }
}

/// Decode datagrams from the circuit and dispatch them until the socket fails
async fn run_pump(socket: Arc<UdpSocket>, dispatcher: Arc<Dispatcher>, circuit: CircuitInfo) {
    let mut codec = FrameCodec::new();
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let len = match socket.recv(&mut buf).await {
            Ok(len) => len,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::ConnectionReset
                ) =>
            {
                // ICMP unreachable bounced back from an earlier send
                tracing::debug!("Circuit {} unreachable: {}", circuit, e);
                continue;
            }
            Err(e) => {
                tracing::warn!("Circuit {} receive failed: {}", circuit, e);
                break;
            }
        };

        let mut datagram = BytesMut::from(&buf[..len]);
        match codec.decode(&mut datagram) {
            Ok(Some(frame)) => {
                tracing::trace!(
                    "Received {:?} (seq {}) on {}",
                    frame.message.message_type(),
                    frame.sequence,
                    circuit
                );
                dispatcher.dispatch(frame.message);
            }
            Ok(None) => {
                tracing::warn!("Truncated datagram ({} bytes) on {}", len, circuit);
            }
            Err(e) => {
                tracing::warn!("Dropping undecodable datagram on {}: {}", circuit, e);
            }
        }
    }
}
