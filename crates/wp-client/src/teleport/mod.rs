//! Teleport handshake: request, notifications, deadline and circuit hand-over

mod controller;
mod notification;
mod reconnect;
mod session;
mod timeout;

pub use controller::TeleportController;
pub use notification::{FinishInfo, TeleportNotification};
pub use reconnect::{switch_region, ReconnectError};
pub use session::{
    Destination, TeleportOutcome, TeleportSession, TeleportStatus, BUSY_MESSAGE,
    CONNECT_FAILED_MESSAGE, FINISHED_MESSAGE, STARTED_MESSAGE, TIMED_OUT_MESSAGE,
};
pub use timeout::TimeoutGuard;
