//! wp-client: Waypoint viewer client
//!
//! Owns the UDP circuit to the current region simulator, routes inbound
//! messages to subscribers, and drives the teleport handshake that moves
//! the agent (and the circuit) to another region.

pub mod dispatch;
pub mod network;
pub mod teleport;

pub use dispatch::Dispatcher;
pub use network::CircuitManager;
pub use teleport::{TeleportController, TeleportOutcome, TeleportStatus};
