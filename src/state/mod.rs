/// Per-question countdown state.
pub mod clock;
/// Runtime game session data.
pub mod game;
mod sse;
/// Session lifecycle state machine.
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::document_store::DocumentStore,
    error::ServiceError,
    state::{game::GameSession, state_machine::SessionStateMachine},
    trivia::QuestionSupplier,
};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

const SSE_CHANNEL_CAPACITY: usize = 16;

/// Everything the engine tracks for one player's session.
///
/// All of it is guarded by a single per-user mutex, which is what makes the
/// two ending paths (wrong answer, clock expiry) mutually exclusive.
#[derive(Default)]
pub struct SessionCell {
    /// Lifecycle machine for this session.
    pub machine: SessionStateMachine,
    /// Gameplay data, present from a successful load until the next restart.
    pub game: Option<GameSession>,
    /// Cached best score for the player.
    pub highest_score: u32,
    /// Room the session is bound to, if started from a room.
    pub room_id: Option<Uuid>,
    /// Bumped on every (re)start so stale clock tasks can detect they
    /// outlived their session and stop without touching it.
    pub generation: u64,
}

/// Central application state storing shared handles and per-user sessions.
pub struct AppState {
    config: AppConfig,
    document_store: RwLock<Option<Arc<dyn DocumentStore>>>,
    supplier: Arc<dyn QuestionSupplier>,
    sse: sse::SseState,
    sessions: DashMap<String, Arc<Mutex<SessionCell>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, supplier: Arc<dyn QuestionSupplier>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            document_store: RwLock::new(None),
            supplier,
            sse: sse::SseState::new(SSE_CHANNEL_CAPACITY),
            sessions: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The configured question supplier.
    pub fn supplier(&self) -> Arc<dyn QuestionSupplier> {
        self.supplier.clone()
    }

    /// Obtain a handle to the current document store, if one is installed.
    pub async fn document_store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.document_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the document store or fail with a degraded-mode error.
    pub async fn require_document_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        self.document_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new document store implementation and leave degraded mode.
    pub async fn install_document_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.document_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current document store and enter degraded mode.
    pub async fn clear_document_store(&self) {
        {
            let mut guard = self.document_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.document_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Session cell for `uid`, created on first use.
    pub fn session(&self, uid: &str) -> Arc<Mutex<SessionCell>> {
        self.sessions
            .entry(uid.to_string())
            .or_default()
            .clone()
    }

    /// SSE hub carrying game events for `uid`.
    pub fn session_hub(&self, uid: &str) -> SseHub {
        self.sse.session(uid)
    }
}
