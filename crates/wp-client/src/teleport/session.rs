//! Per-handshake teleport state

use std::fmt;

use wp_protocol::{RegionHandle, Vector3};

/// Message reported once the simulator has accepted the request
pub const STARTED_MESSAGE: &str = "Teleport started";

/// Message reported on arrival in the destination region
pub const FINISHED_MESSAGE: &str = "Teleport finished";

/// Message reported when the deadline passes first
pub const TIMED_OUT_MESSAGE: &str = "Teleport timed out";

/// Message reported when the destination circuit cannot be opened
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect to destination region";

/// Message reported to a caller that overlaps an in-flight teleport
pub const BUSY_MESSAGE: &str = "Another teleport is already in progress";

/// Teleport lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportStatus {
    /// Session created, request not sent yet
    Pending,
    /// Request sent, waiting for the simulator
    Requested,
    /// Agent arrived in the destination region
    Succeeded,
    /// Simulator rejected the teleport or the hop failed
    Failed,
    /// No resolution before the deadline
    TimedOut,
}

impl TeleportStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TeleportStatus::Succeeded | TeleportStatus::Failed | TeleportStatus::TimedOut
        )
    }
}

impl fmt::Display for TeleportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeleportStatus::Pending => write!(f, "pending"),
            TeleportStatus::Requested => write!(f, "requested"),
            TeleportStatus::Succeeded => write!(f, "succeeded"),
            TeleportStatus::Failed => write!(f, "failed"),
            TeleportStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Where the caller asked to go
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub region_handle: RegionHandle,
    pub position: Vector3,
}

/// State of one teleport handshake.
///
/// Once a terminal status is reached, status and message are frozen and
/// every further mutation is a no-op.
#[derive(Debug, Clone)]
pub struct TeleportSession {
    status: TeleportStatus,
    message: String,
    destination: Destination,
    deadline_armed: bool,
}

impl TeleportSession {
    /// Create a pending session for `destination`
    pub fn new(destination: Destination) -> Self {
        Self {
            status: TeleportStatus::Pending,
            message: String::new(),
            destination,
            deadline_armed: false,
        }
    }

    pub fn status(&self) -> TeleportStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn deadline_armed(&self) -> bool {
        self.deadline_armed
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record that the request went out. Only valid from `Pending`.
    pub(crate) fn mark_requested(&mut self) -> bool {
        if self.status != TeleportStatus::Pending {
            return false;
        }
        self.status = TeleportStatus::Requested;
        true
    }

    /// Replace the status text without changing status
    pub(crate) fn set_message(&mut self, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.message = message.into();
        true
    }

    pub(crate) fn succeed(&mut self) -> bool {
        self.resolve(TeleportStatus::Succeeded, FINISHED_MESSAGE)
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.resolve(TeleportStatus::Failed, reason)
    }

    pub(crate) fn time_out(&mut self) -> bool {
        self.resolve(TeleportStatus::TimedOut, TIMED_OUT_MESSAGE)
    }

    pub(crate) fn set_deadline_armed(&mut self, armed: bool) {
        self.deadline_armed = armed;
    }

    fn resolve(&mut self, status: TeleportStatus, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = status;
        self.message = message.into();
        true
    }

    /// Snapshot handed back to the caller
    pub fn outcome(&self) -> TeleportOutcome {
        TeleportOutcome {
            status: self.status,
            message: self.message.clone(),
        }
    }
}

/// Result of a teleport request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportOutcome {
    pub status: TeleportStatus,
    pub message: String,
}

impl TeleportOutcome {
    /// Placeholder before any handshake has run
    pub(crate) fn idle() -> Self {
        Self {
            status: TeleportStatus::Pending,
            message: String::new(),
        }
    }

    /// Outcome for a request refused because another one is in flight
    pub(crate) fn busy() -> Self {
        Self {
            status: TeleportStatus::Failed,
            message: BUSY_MESSAGE.to_string(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == TeleportStatus::Succeeded
    }
}

impl From<TeleportOutcome> for (bool, String) {
    fn from(outcome: TeleportOutcome) -> Self {
        (outcome.succeeded(), outcome.message)
    }
}
