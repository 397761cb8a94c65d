//! Message types for the Waypoint protocol
//!
//! This module defines the messages exchanged between the client and a
//! region simulator. Messages are serialized into frames using the codec
//! defined in `codec.rs`.
//!
//! # Teleport Flow
//!
//! 1. Client sends `TeleportLocationRequest` on its current circuit
//! 2. Simulator answers with `TeleportStart`, zero or more `TeleportProgress`,
//!    and finally either `TeleportFailed` or `TeleportFinish`
//! 3. On `TeleportFinish` the client opens a circuit to the destination
//!    simulator with `UseCircuitCode` and sends `CompleteAgentMovement`
//!
//! Arrival order between the simulator-pushed messages is not guaranteed.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::types::{AgentId, CircuitCode, RegionHandle, SessionId, Vector3};

/// Message type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Bind a new circuit to the session
    UseCircuitCode = 0x01,
    /// Ask the current simulator to move the agent
    TeleportLocationRequest = 0x02,
    /// Confirm arrival on the destination simulator
    CompleteAgentMovement = 0x03,
    /// Simulator accepted the teleport
    TeleportStart = 0x10,
    /// Simulator progress text
    TeleportProgress = 0x11,
    /// Simulator rejected the teleport
    TeleportFailed = 0x12,
    /// Simulator handed the agent over to the destination
    TeleportFinish = 0x13,
}

impl MessageType {
    /// Convert to u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::UseCircuitCode),
            0x02 => Some(Self::TeleportLocationRequest),
            0x03 => Some(Self::CompleteAgentMovement),
            0x10 => Some(Self::TeleportStart),
            0x11 => Some(Self::TeleportProgress),
            0x12 => Some(Self::TeleportFailed),
            0x13 => Some(Self::TeleportFinish),
            _ => None,
        }
    }

    /// The simulator-pushed notifications that drive a teleport
    pub const TELEPORT_NOTIFICATIONS: [MessageType; 4] = [
        MessageType::TeleportStart,
        MessageType::TeleportProgress,
        MessageType::TeleportFailed,
        MessageType::TeleportFinish,
    ];
}

/// Protocol messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Circuit binding, first message on every new circuit
    UseCircuitCode {
        code: CircuitCode,
        session_id: SessionId,
        agent_id: AgentId,
    },

    /// Teleport request to a location in another region
    TeleportLocationRequest {
        agent_id: AgentId,
        session_id: SessionId,
        region_handle: RegionHandle,
        position: Vector3,
        /// Direction the avatar faces on arrival
        look_at: Vector3,
    },

    /// Movement confirmation sent to the destination simulator
    CompleteAgentMovement {
        agent_id: AgentId,
        session_id: SessionId,
        circuit_code: CircuitCode,
    },

    /// Teleport accepted
    TeleportStart { teleport_flags: u32 },

    /// Teleport progress report
    TeleportProgress {
        agent_id: AgentId,
        teleport_flags: u32,
        /// Status text, possibly NUL padded
        message: Bytes,
    },

    /// Teleport rejected
    TeleportFailed {
        agent_id: AgentId,
        /// Failure reason, possibly NUL padded
        reason: Bytes,
    },

    /// Teleport completed on the simulator side.
    ///
    /// The destination fields are optional because simulators have been
    /// seen omitting them; the client decides what to do with a partial
    /// destination.
    TeleportFinish {
        agent_id: AgentId,
        location_id: u32,
        #[serde(default)]
        sim_ip: Option<Ipv4Addr>,
        #[serde(default)]
        sim_port: Option<u16>,
        #[serde(default)]
        region_handle: Option<RegionHandle>,
        teleport_flags: u32,
    },
}

impl Message {
    /// Get the message type for this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::UseCircuitCode { .. } => MessageType::UseCircuitCode,
            Message::TeleportLocationRequest { .. } => MessageType::TeleportLocationRequest,
            Message::CompleteAgentMovement { .. } => MessageType::CompleteAgentMovement,
            Message::TeleportStart { .. } => MessageType::TeleportStart,
            Message::TeleportProgress { .. } => MessageType::TeleportProgress,
            Message::TeleportFailed { .. } => MessageType::TeleportFailed,
            Message::TeleportFinish { .. } => MessageType::TeleportFinish,
        }
    }

    /// Build a teleport request facing along +X from the target position
    pub fn teleport_location_request(
        agent_id: AgentId,
        session_id: SessionId,
        region_handle: RegionHandle,
        position: Vector3,
    ) -> Self {
        Message::TeleportLocationRequest {
            agent_id,
            session_id,
            region_handle,
            position,
            look_at: position + Vector3::UNIT_X,
        }
    }

    /// Build the movement confirmation for a freshly opened circuit
    pub fn complete_agent_movement(
        agent_id: AgentId,
        session_id: SessionId,
        circuit_code: CircuitCode,
    ) -> Self {
        Message::CompleteAgentMovement {
            agent_id,
            session_id,
            circuit_code,
        }
    }
}

/// Decode simulator text: lossy UTF-8 with NUL padding removed
pub fn decode_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace('\0', "")
}
