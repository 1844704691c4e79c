use tokio::sync::{Mutex, broadcast};
use tracing::trace;

use crate::dto::sse::ServerEvent;

const PUBLIC_CAPACITY: usize = 64;
const ADMIN_CAPACITY: usize = 64;

/// Event fan-out for the spectator and admin streams, plus the admin seat.
pub struct SseChannels {
    pub(super) public: SseHub,
    pub(super) admin: SseHub,
    /// Token of the connected admin console; `None` while the seat is free.
    pub(super) admin_token: Mutex<Option<String>>,
}

impl Default for SseChannels {
    fn default() -> Self {
        Self {
            public: SseHub::new(PUBLIC_CAPACITY),
            admin: SseHub::new(ADMIN_CAPACITY),
            admin_token: Mutex::new(None),
        }
    }
}

/// One broadcast channel of named JSON events.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Connected stream count.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Lagging or absent subscribers are not an error for the sender.
    pub fn broadcast(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            trace!("event dropped; no subscribers");
        }
    }
}
