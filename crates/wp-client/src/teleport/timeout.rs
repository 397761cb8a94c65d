//! One-shot teleport deadline

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Expiry {
    fired: AtomicBool,
    notify: Notify,
}

/// Deadline armed once per handshake.
///
/// A timer task flips a shared flag when the duration elapses. Nothing
/// extends the deadline; disarming (or dropping) the guard stops the task.
#[derive(Debug)]
pub struct TimeoutGuard {
    expiry: Arc<Expiry>,
    timer: Option<JoinHandle<()>>,
}

impl TimeoutGuard {
    /// Start the deadline. Must be called inside a tokio runtime.
    pub fn arm(duration: Duration) -> Self {
        let expiry = Arc::new(Expiry::default());
        let timer_expiry = Arc::clone(&expiry);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            timer_expiry.fired.store(true, Ordering::Release);
            timer_expiry.notify.notify_waiters();
        });

        Self {
            expiry,
            timer: Some(timer),
        }
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.expiry.fired.load(Ordering::Acquire)
    }

    /// Whether the timer is still running
    pub fn is_armed(&self) -> bool {
        self.timer.is_some() && !self.is_expired()
    }

    /// Resolve once the deadline passes. Never resolves after `disarm`
    /// unless the deadline had already fired.
    pub async fn expired(&self) {
        loop {
            let notified = self.expiry.notify.notified();
            if self.is_expired() {
                return;
            }
            notified.await;
        }
    }

    /// Stop the timer. Idempotent.
    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_duration() {
        let start = Instant::now();
        let guard = TimeoutGuard::arm(Duration::from_millis(8000));
        assert!(guard.is_armed());
        assert!(!guard.is_expired());

        guard.expired().await;

        assert!(guard.is_expired());
        assert!(!guard.is_armed());
        assert!(start.elapsed() >= Duration::from_millis(8000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_guard_never_fires() {
        let mut guard = TimeoutGuard::arm(Duration::from_millis(100));
        guard.disarm();
        guard.disarm();
        assert!(!guard.is_armed());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!guard.is_expired());

        let waited = tokio::time::timeout(Duration::from_secs(1), guard.expired()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_expired_before_deadline() {
        let guard = TimeoutGuard::arm(Duration::from_millis(8000));
        tokio::time::sleep(Duration::from_millis(7999)).await;
        assert!(!guard.is_expired());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(guard.is_expired());
    }
}
