use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// SSE-specific sub-state carved out from [`AppState`](super::AppState).
///
/// Room and chat streams ride directly on document-store subscriptions, so
/// the only hubs kept here are the per-user session streams.
pub struct SseState {
    sessions: DashMap<String, SseHub>,
    capacity: usize,
}

impl SseState {
    /// Build the SSE sub-tree with a per-hub channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            capacity,
        }
    }

    /// Hub carrying game events for `uid`, created on first use.
    pub fn session(&self, uid: &str) -> SseHub {
        self.sessions
            .entry(uid.to_string())
            .or_insert_with(|| SseHub::new(self.capacity))
            .clone()
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
