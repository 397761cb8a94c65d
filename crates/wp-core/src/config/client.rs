//! Client configuration

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::serde_utils::duration_millis;
use crate::error::ConfigError;

/// Configuration for the viewer client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Teleport handshake settings
    pub teleport: TeleportConfig,

    /// Circuit settings
    pub network: NetworkConfig,
}

/// Teleport handshake timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    /// Deadline for the whole handshake, counted from the request.
    /// Progress reports never extend it.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,

    /// Pause after arriving on the destination simulator so parcel and
    /// other follow-up data can come in before the teleport is reported
    #[serde(with = "duration_millis")]
    pub settle_interval: Duration,

    /// Limit on opening the destination circuit after a finish notice
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(8000),
            settle_interval: Duration::from_millis(1000),
            connect_timeout: Duration::from_millis(5000),
        }
    }
}

/// Circuit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Local address circuits bind to
    pub bind_address: String,

    /// Keep capability services bound when switching simulators
    pub use_caps: bool,
}

impl NetworkConfig {
    /// Parsed [`bind_address`](Self::bind_address)
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|source| ConfigError::BindAddress {
                address: self.bind_address.clone(),
                source,
            })
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:0".to_string(),
            use_caps: true,
        }
    }
}
