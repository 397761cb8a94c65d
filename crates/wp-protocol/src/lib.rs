//! wp-protocol: Wire protocol for the Waypoint client
//!
//! This crate defines the typed messages exchanged between the client and a
//! region simulator, plus the frame format used to carry them over a circuit.

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;
pub mod types;

pub use codec::{Frame, FrameCodec};
pub use error::ProtocolError;
pub use frame::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use message::{decode_text, Message, MessageType};
pub use types::{AgentId, CircuitCode, RegionHandle, SessionId, Vector3};
