//! Inbound message dispatch
//!
//! The circuit pump hands every decoded message to the [`Dispatcher`], which
//! forwards it to the subscribers registered for that message type.

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use wp_protocol::{Message, MessageType};

/// Channel capacity for a subscriber created through [`Dispatcher::subscribe`].
///
/// A teleport produces a handful of notifications; 64 leaves room for a
/// chatty simulator while the subscriber is busy reconnecting.
pub const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

/// Routes inbound messages to subscribers by message type
#[derive(Debug, Default)]
pub struct Dispatcher {
    routes: DashMap<MessageType, Vec<mpsc::Sender<Message>>>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
        }
    }

    /// Register `tx` to receive every message of `kind`
    pub fn register(&self, kind: MessageType, tx: mpsc::Sender<Message>) {
        self.routes.entry(kind).or_default().push(tx);
    }

    /// Subscribe to several message kinds through one channel
    pub fn subscribe(&self, kinds: &[MessageType]) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        for kind in kinds {
            self.register(*kind, tx.clone());
        }
        rx
    }

    /// Deliver a message to its subscribers.
    ///
    /// Never blocks. Returns how many subscribers accepted the message.
    pub fn dispatch(&self, message: Message) -> usize {
        let kind = message.message_type();
        let Some(mut senders) = self.routes.get_mut(&kind) else {
            tracing::trace!("No subscriber for {:?}", kind);
            return 0;
        };

        senders.retain(|tx| !tx.is_closed());

        let mut delivered = 0;
        for tx in senders.iter() {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Subscriber for {:?} is full, dropping message", kind);
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Number of live subscribers for `kind`
    pub fn subscriber_count(&self, kind: MessageType) -> usize {
        self.routes
            .get(&kind)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}
