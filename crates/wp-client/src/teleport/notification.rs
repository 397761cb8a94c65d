//! Typed teleport notifications

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use wp_protocol::{decode_text, Message, RegionHandle};

use super::reconnect::ReconnectError;

/// Simulator-pushed events that drive a teleport handshake
#[derive(Debug, Clone, PartialEq)]
pub enum TeleportNotification {
    /// Simulator accepted the request
    Start,
    /// Free-form progress text
    Progress { message: String },
    /// Simulator rejected the request
    Failed { reason: String },
    /// Simulator handed the agent over to the destination
    Finish(FinishInfo),
}

impl TeleportNotification {
    /// Convert a protocol message, or `None` if it is not a teleport event
    pub fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::TeleportStart { .. } => Some(Self::Start),
            Message::TeleportProgress { message, .. } => Some(Self::Progress {
                message: decode_text(&message),
            }),
            Message::TeleportFailed { reason, .. } => Some(Self::Failed {
                reason: decode_text(&reason),
            }),
            Message::TeleportFinish {
                sim_ip,
                sim_port,
                region_handle,
                ..
            } => Some(Self::Finish(FinishInfo {
                sim_ip,
                sim_port,
                region_handle,
            })),
            _ => None,
        }
    }
}

/// Destination fields carried by a finish notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishInfo {
    pub sim_ip: Option<Ipv4Addr>,
    pub sim_port: Option<u16>,
    pub region_handle: Option<RegionHandle>,
}

impl FinishInfo {
    /// Destination simulator endpoint and region.
    ///
    /// All three fields are required; a partial destination is an error.
    pub fn destination(&self) -> Result<(SocketAddr, RegionHandle), ReconnectError> {
        let ip = self.sim_ip.ok_or(ReconnectError::MissingField("sim_ip"))?;
        let port = self
            .sim_port
            .ok_or(ReconnectError::MissingField("sim_port"))?;
        let region_handle = self
            .region_handle
            .ok_or(ReconnectError::MissingField("region_handle"))?;

        Ok((SocketAddr::new(IpAddr::V4(ip), port), region_handle))
    }
}
