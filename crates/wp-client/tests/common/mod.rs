//! Shared test fixtures: a scripted in-memory network

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use wp_client::Dispatcher;
use wp_core::error::ConnectionError;
use wp_core::traits::Network;
use wp_core::{AgentCredentials, CircuitInfo};
use wp_protocol::{AgentId, CircuitCode, Message, RegionHandle, SessionId};

pub const HOME_SIM: &str = "10.0.0.1:9000";
pub const HOME_CIRCUIT: CircuitCode = CircuitCode(4242);

/// Network double that records traffic and answers teleport requests
/// with scripted simulator messages.
pub struct MockNetwork {
    credentials: AgentCredentials,
    dispatcher: Arc<Dispatcher>,
    circuit: Mutex<Option<CircuitInfo>>,
    sent: Mutex<Vec<Message>>,
    connects: Mutex<Vec<(SocketAddr, CircuitCode, bool)>>,
    replies: Mutex<VecDeque<Vec<Message>>>,
    connect_ok: AtomicBool,
    connect_stalls: AtomicBool,
    send_ok: AtomicBool,
}

impl MockNetwork {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            credentials: AgentCredentials::new(AgentId::random(), SessionId::random()),
            dispatcher,
            circuit: Mutex::new(Some(CircuitInfo {
                code: HOME_CIRCUIT,
                endpoint: HOME_SIM.parse().unwrap(),
            })),
            sent: Mutex::new(Vec::new()),
            connects: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            connect_ok: AtomicBool::new(true),
            connect_stalls: AtomicBool::new(false),
            send_ok: AtomicBool::new(true),
        }
    }

    /// Messages the simulator pushes when the next teleport request arrives
    pub fn reply_to_next_request(&self, messages: Vec<Message>) {
        self.replies.lock().unwrap().push_back(messages);
    }

    pub fn fail_connects(&self) {
        self.connect_ok.store(false, Ordering::SeqCst);
    }

    /// Make `connect` hang forever, like a destination that never answers
    pub fn stall_connects(&self) {
        self.connect_stalls.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends(&self) {
        self.send_ok.store(false, Ordering::SeqCst);
    }

    pub fn drop_circuit(&self) {
        *self.circuit.lock().unwrap() = None;
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<(SocketAddr, CircuitCode, bool)> {
        self.connects.lock().unwrap().clone()
    }

    pub fn circuit(&self) -> Option<CircuitInfo> {
        *self.circuit.lock().unwrap()
    }
}

#[async_trait]
impl Network for MockNetwork {
    fn credentials(&self) -> AgentCredentials {
        self.credentials
    }

    async fn current_circuit(&self) -> Option<CircuitInfo> {
        *self.circuit.lock().unwrap()
    }

    async fn send(&self, message: Message) -> Result<(), ConnectionError> {
        if !self.send_ok.load(Ordering::SeqCst) {
            return Err(ConnectionError::SendFailed("socket closed".to_string()));
        }

        let is_request = matches!(message, Message::TeleportLocationRequest { .. });
        self.sent.lock().unwrap().push(message);

        if is_request {
            let replies = self.replies.lock().unwrap().pop_front().unwrap_or_default();
            for reply in replies {
                self.dispatcher.dispatch(reply);
            }
        }
        Ok(())
    }

    async fn connect(
        &self,
        endpoint: SocketAddr,
        circuit_code: CircuitCode,
        use_caps: bool,
    ) -> Result<(), ConnectionError> {
        self.connects
            .lock()
            .unwrap()
            .push((endpoint, circuit_code, use_caps));

        if self.connect_stalls.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if !self.connect_ok.load(Ordering::SeqCst) {
            return Err(ConnectionError::ConnectFailed {
                endpoint,
                reason: "no route to host".to_string(),
            });
        }

        *self.circuit.lock().unwrap() = Some(CircuitInfo {
            code: circuit_code,
            endpoint,
        });
        Ok(())
    }
}

pub fn start() -> Message {
    Message::TeleportStart { teleport_flags: 0 }
}

pub fn progress(text: &str) -> Message {
    Message::TeleportProgress {
        agent_id: AgentId::random(),
        teleport_flags: 0,
        message: Bytes::from(format!("{}\0", text)),
    }
}

pub fn failed(reason: &str) -> Message {
    Message::TeleportFailed {
        agent_id: AgentId::random(),
        reason: Bytes::from(format!("{}\0", reason)),
    }
}

pub fn finish(ip: Option<Ipv4Addr>, port: Option<u16>, handle: Option<u64>) -> Message {
    Message::TeleportFinish {
        agent_id: AgentId::random(),
        location_id: 0,
        sim_ip: ip,
        sim_port: port,
        region_handle: handle.map(RegionHandle::new),
        teleport_flags: 0,
    }
}

/// Finish pointing at 10.0.0.5:9000, region 42
pub fn finish_ok() -> Message {
    finish(Some(Ipv4Addr::new(10, 0, 0, 5)), Some(9000), Some(42))
}
