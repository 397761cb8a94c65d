//! Teleport handshake driver
//!
//! [`TeleportController::request_teleport`] sends the request, then waits
//! for the simulator's notifications until the handshake resolves or the
//! deadline passes. Notifications arrive through a dispatcher subscription
//! and are applied on the waiting task, so the session needs no locking.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};

use wp_core::config::TeleportConfig;
use wp_core::traits::Network;
use wp_protocol::{Message, MessageType, RegionHandle, Vector3};

use super::notification::TeleportNotification;
use super::reconnect::{switch_region, ReconnectError};
use super::session::{
    Destination, TeleportOutcome, TeleportSession, CONNECT_FAILED_MESSAGE, STARTED_MESSAGE,
};
use super::timeout::TimeoutGuard;
use crate::dispatch::Dispatcher;

/// State guarded for the duration of one handshake
struct Handshake {
    inbox: mpsc::Receiver<Message>,
    last: Option<TeleportSession>,
}

/// Drives teleport handshakes for one client, one at a time
pub struct TeleportController<N: Network> {
    network: Arc<N>,
    config: TeleportConfig,
    use_caps: bool,
    handshake: Mutex<Handshake>,
    updates: watch::Sender<TeleportOutcome>,
}

impl<N: Network> TeleportController<N> {
    /// Create a controller and subscribe it to teleport notifications
    pub fn new(network: Arc<N>, dispatcher: &Dispatcher, config: TeleportConfig) -> Self {
        let inbox = dispatcher.subscribe(&MessageType::TELEPORT_NOTIFICATIONS);

        Self {
            network,
            config,
            use_caps: true,
            handshake: Mutex::new(Handshake { inbox, last: None }),
            updates: watch::channel(TeleportOutcome::idle()).0,
        }
    }

    /// Whether the destination circuit keeps capability services
    pub fn with_use_caps(mut self, use_caps: bool) -> Self {
        self.use_caps = use_caps;
        self
    }

    /// Teleport the agent to `position` in the region at `region_handle`.
    ///
    /// Resolves once the handshake succeeds, fails, or times out. Failures
    /// are reported through the outcome, never as an error. A call made
    /// while another handshake is in flight is refused immediately.
    pub async fn request_teleport(
        &self,
        region_handle: RegionHandle,
        position: Vector3,
    ) -> TeleportOutcome {
        let Ok(mut handshake) = self.handshake.try_lock() else {
            tracing::warn!(
                "Teleport to region {} refused: another teleport is in flight",
                region_handle
            );
            return TeleportOutcome::busy();
        };
        let handshake = &mut *handshake;

        let stale = discard_stale(&mut handshake.inbox);
        if stale > 0 {
            tracing::debug!("Discarded {} stale teleport notifications", stale);
        }

        let mut session = TeleportSession::new(Destination {
            region_handle,
            position,
        });
        let mut guard = TimeoutGuard::arm(self.config.timeout);
        session.set_deadline_armed(true);
        self.publish(&session);

        let credentials = self.network.credentials();
        let request = Message::teleport_location_request(
            credentials.agent_id,
            credentials.session_id,
            region_handle,
            position,
        );

        tracing::info!("Teleporting to region {}", region_handle);

        match self.network.send(request).await {
            Ok(()) => {
                session.mark_requested();
                self.publish(&session);
                self.wait_for_resolution(&mut session, &mut handshake.inbox, &guard)
                    .await;
            }
            Err(e) => {
                tracing::warn!("Teleport request to region {} not sent: {}", region_handle, e);
                session.fail(format!("Failed to send teleport request: {}", e));
            }
        }

        guard.disarm();
        session.set_deadline_armed(false);
        self.publish(&session);

        tracing::info!(
            "Teleport to region {} {}: {}",
            region_handle,
            session.status(),
            session.message()
        );

        let outcome = session.outcome();
        handshake.last = Some(session);
        outcome
    }

    /// Watch status and message of the current handshake as they change
    pub fn updates(&self) -> watch::Receiver<TeleportOutcome> {
        self.updates.subscribe()
    }

    /// The most recently completed handshake, unless one is in flight
    pub fn last_session(&self) -> Option<TeleportSession> {
        self.handshake
            .try_lock()
            .ok()
            .and_then(|handshake| handshake.last.clone())
    }

    async fn wait_for_resolution(
        &self,
        session: &mut TeleportSession,
        inbox: &mut mpsc::Receiver<Message>,
        guard: &TimeoutGuard,
    ) {
        while !session.is_terminal() {
            // Checked up front so a steady stream of progress cannot starve the deadline
            if guard.is_expired() {
                session.time_out();
                break;
            }

            tokio::select! {
                biased;
                message = inbox.recv() => match message {
                    Some(message) => self.handle_message(session, message).await,
                    None => {
                        session.fail("Notification channel closed");
                    }
                },
                _ = guard.expired() => {
                    session.time_out();
                }
            }
        }
    }

    async fn handle_message(&self, session: &mut TeleportSession, message: Message) {
        let Some(notification) = TeleportNotification::from_message(message) else {
            return;
        };
        tracing::debug!("Teleport notification: {:?}", notification);
        self.apply(session, notification).await;
        self.publish(session);
    }

    fn publish(&self, session: &TeleportSession) {
        self.updates.send_replace(session.outcome());
    }

    /// Apply one notification. No-op once the session is terminal.
    async fn apply(&self, session: &mut TeleportSession, notification: TeleportNotification) {
        if session.is_terminal() {
            tracing::debug!("Ignoring {:?} for finished teleport", notification);
            return;
        }

        match notification {
            TeleportNotification::Start => {
                session.set_message(STARTED_MESSAGE);
            }
            TeleportNotification::Progress { message } => {
                session.set_message(message);
            }
            TeleportNotification::Failed { reason } => {
                session.fail(reason);
            }
            TeleportNotification::Finish(finish) => {
                match switch_region(self.network.as_ref(), &finish, &self.config, self.use_caps)
                    .await
                {
                    Ok(_) => {
                        session.succeed();
                    }
                    Err(e @ ReconnectError::MissingField(_)) => {
                        tracing::warn!("{}", e);
                        session.fail(e.to_string());
                    }
                    Err(e) => {
                        tracing::warn!("Teleport hand-over failed: {}", e);
                        session.fail(CONNECT_FAILED_MESSAGE);
                    }
                }
            }
        }
    }
}

/// Drop notifications left over from earlier handshakes
fn discard_stale(inbox: &mut mpsc::Receiver<Message>) -> usize {
    let mut count = 0;
    while inbox.try_recv().is_ok() {
        count += 1;
    }
    count
}
