//! Error types shared across the Waypoint crates

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use wp_protocol::ProtocolError;

/// Errors surfaced while setting up or running the client
#[derive(Error, Debug)]
pub enum WpError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures on a simulator circuit
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// `send` was called with no circuit open
    #[error("Not connected to a simulator")]
    NotConnected,

    #[error("Failed to connect to {endpoint}: {reason}")]
    ConnectFailed { endpoint: SocketAddr, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Outbound message could not be framed
    #[error("Encode failed: {0}")]
    Encode(#[from] ProtocolError),
}

/// Problems reading, writing or interpreting the client config
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid bind address '{address}': {source}")]
    BindAddress {
        address: String,
        source: AddrParseError,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
