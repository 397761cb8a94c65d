//! Circuit integration tests
//!
//! Runs the UDP circuit manager against fake simulators on loopback and
//! walks a full teleport from one simulator to the other.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};

use wp_client::teleport::{TeleportController, TeleportStatus, FINISHED_MESSAGE};
use wp_client::{CircuitManager, Dispatcher};
use wp_core::config::{NetworkConfig, TeleportConfig};
use wp_core::error::ConnectionError;
use wp_core::traits::Network;
use wp_core::AgentCredentials;
use wp_protocol::{
    AgentId, CircuitCode, Frame, FrameCodec, Message, MessageType, RegionHandle, SessionId,
    Vector3,
};

const CODE: CircuitCode = CircuitCode(777);

/// A simulator double listening on loopback
struct FakeSim {
    socket: UdpSocket,
    codec: FrameCodec,
    sequence: u32,
}

impl FakeSim {
    async fn bind() -> Self {
        Self {
            socket: UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            codec: FrameCodec::new(),
            sequence: 1,
        }
    }

    fn addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    async fn recv(&mut self) -> (Message, SocketAddr) {
        let mut buf = vec![0u8; 65_536];
        let (len, from) = timeout(Duration::from_secs(5), self.socket.recv_from(&mut buf))
            .await
            .expect("Timed out waiting for client datagram")
            .unwrap();

        let mut datagram = BytesMut::from(&buf[..len]);
        let frame = self.codec.decode(&mut datagram).unwrap().unwrap();
        (frame.message, from)
    }

    async fn send(&mut self, to: SocketAddr, message: Message) {
        let mut buf = BytesMut::new();
        self.codec
            .encode(Frame::new(self.sequence, message), &mut buf)
            .unwrap();
        self.sequence += 1;
        self.socket.send_to(&buf, to).await.unwrap();
    }
}

fn loopback_config() -> NetworkConfig {
    NetworkConfig {
        bind_address: "127.0.0.1:0".to_string(),
        use_caps: true,
    }
}

fn credentials() -> AgentCredentials {
    AgentCredentials::new(AgentId::random(), SessionId::random())
}

#[tokio::test]
async fn test_connect_announces_circuit_code() {
    let mut sim = FakeSim::bind().await;
    let credentials = credentials();
    let dispatcher = Arc::new(Dispatcher::new());
    let manager = CircuitManager::new(&loopback_config(), credentials, dispatcher).unwrap();

    manager.connect(sim.addr(), CODE, true).await.unwrap();

    let (message, from) = sim.recv().await;
    assert_eq!(
        message,
        Message::UseCircuitCode {
            code: CODE,
            session_id: credentials.session_id,
            agent_id: credentials.agent_id,
        }
    );
    assert_eq!(Some(from), manager.local_addr().await);

    let circuit = manager.current_circuit().await.unwrap();
    assert_eq!(circuit.endpoint, sim.addr());
    assert_eq!(circuit.code, CODE);
    assert!(manager.caps_enabled().await);
}

#[tokio::test]
async fn test_inbound_frames_reach_subscribers() {
    let mut sim = FakeSim::bind().await;
    let dispatcher = Arc::new(Dispatcher::new());
    let mut inbox = dispatcher.subscribe(&[MessageType::TeleportFailed]);
    let manager =
        CircuitManager::new(&loopback_config(), credentials(), Arc::clone(&dispatcher)).unwrap();

    manager.connect(sim.addr(), CODE, true).await.unwrap();
    let (_, client) = sim.recv().await;

    // Garbage first; the pump must drop it and keep going
    sim.socket.send_to(&[0xde, 0xad], client).await.unwrap();
    sim.send(
        client,
        Message::TeleportFailed {
            agent_id: AgentId::random(),
            reason: Bytes::from_static(b"Region full\0"),
        },
    )
    .await;

    let message = timeout(Duration::from_secs(5), inbox.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(message, Message::TeleportFailed { .. }));
}

#[tokio::test]
async fn test_send_without_circuit() {
    let manager = CircuitManager::new(
        &loopback_config(),
        credentials(),
        Arc::new(Dispatcher::new()),
    )
    .unwrap();

    let result = manager
        .send(Message::TeleportStart { teleport_flags: 0 })
        .await;
    assert!(matches!(result, Err(ConnectionError::NotConnected)));
}

#[tokio::test]
async fn test_invalid_bind_address() {
    let config = NetworkConfig {
        bind_address: "not-an-address".to_string(),
        use_caps: true,
    };
    assert!(CircuitManager::new(&config, credentials(), Arc::new(Dispatcher::new())).is_err());
}

#[tokio::test]
async fn test_teleport_between_simulators() {
    let mut home = FakeSim::bind().await;
    let mut destination = FakeSim::bind().await;
    let destination_addr = destination.addr();

    let credentials = credentials();
    let dispatcher = Arc::new(Dispatcher::new());
    let manager = Arc::new(
        CircuitManager::new(&loopback_config(), credentials, Arc::clone(&dispatcher)).unwrap(),
    );
    manager.connect(home.addr(), CODE, true).await.unwrap();
    let (_, client) = home.recv().await;

    let controller = TeleportController::new(
        Arc::clone(&manager),
        &dispatcher,
        TeleportConfig {
            timeout: Duration::from_secs(5),
            settle_interval: Duration::from_millis(50),
            connect_timeout: Duration::from_secs(2),
        },
    );

    let home_sim = tokio::spawn(async move {
        let (request, _) = home.recv().await;
        assert!(matches!(
            request,
            Message::TeleportLocationRequest { region_handle, .. } if region_handle == RegionHandle(42)
        ));

        home.send(client, Message::TeleportStart { teleport_flags: 0 })
            .await;
        home.send(
            client,
            Message::TeleportFinish {
                agent_id: AgentId::random(),
                location_id: 0,
                sim_ip: Some(Ipv4Addr::LOCALHOST),
                sim_port: Some(destination_addr.port()),
                region_handle: Some(RegionHandle(42)),
                teleport_flags: 0,
            },
        )
        .await;
    });

    let destination_sim = tokio::spawn(async move {
        let (first, _) = destination.recv().await;
        let (second, _) = destination.recv().await;
        (first, second)
    });

    let outcome = controller
        .request_teleport(RegionHandle(42), Vector3::new(128.0, 128.0, 30.0))
        .await;

    assert_eq!(outcome.status, TeleportStatus::Succeeded);
    assert_eq!(outcome.message, FINISHED_MESSAGE);
    home_sim.await.unwrap();

    let (first, second) = destination_sim.await.unwrap();
    assert!(matches!(first, Message::UseCircuitCode { code, .. } if code == CODE));
    assert_eq!(
        second,
        Message::CompleteAgentMovement {
            agent_id: credentials.agent_id,
            session_id: credentials.session_id,
            circuit_code: CODE,
        }
    );

    assert_eq!(
        manager.current_circuit().await.unwrap().endpoint,
        destination_addr
    );
    manager.close().await;
    assert!(manager.current_circuit().await.is_none());
}
