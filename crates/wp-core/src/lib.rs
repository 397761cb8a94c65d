//! wp-core: Core abstractions and configuration for Waypoint
//!
//! This crate provides shared types, the network trait the teleport
//! machinery drives, and configuration structures used by the client.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::WpError;
pub use types::{AgentCredentials, CircuitInfo};
