//! Authentication events raised by the transport layer.
//!
//! The client never clears credentials itself. It publishes [`AuthEvent`]s and
//! whoever owns the session decides what to do
//! (see `crate::auth::spawn_expiry_listener`).

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The service rejected the bearer token; no further request can succeed
    /// until the user logs in again.
    Expired,
}

/// Broadcast hub for [`AuthEvent`]s. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no listener is not an error.
    pub fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Auth event dropped: no listener");
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
