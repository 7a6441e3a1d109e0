use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    chat::ChatMessageView,
    common::{EndReasonDto, QuestionSnapshot},
    room::RoomSummary,
};

/// Dispatched payload carried across SSE channels.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE event name, when the payload is typed.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event carrying a plain-text data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Broadcast when a session enters the loading phase.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionLoadingEvent {
    /// Number of questions being fetched.
    pub question_count: usize,
}

/// Broadcast when a session presents a question (first or after an advance).
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionQuestionEvent {
    /// The question now current.
    pub question: QuestionSnapshot,
    /// Score so far.
    pub score: u32,
    /// Seconds on the fresh countdown.
    pub time_left: u8,
}

/// Broadcast on every countdown tick.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionTickEvent {
    /// Seconds left before expiry.
    pub time_left: u8,
}

/// Broadcast exactly once when a session ends.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionEndedEvent {
    /// Score the session ended with.
    pub final_score: u32,
    /// Best score known for the player after this session.
    pub highest_score: u32,
    /// Why the session ended.
    pub reason: EndReasonDto,
}

/// Broadcast when the question fetch failed and the session went inert.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionFailedEvent {
    /// Human readable failure description.
    pub message: String,
}

/// Broadcast when the player's stored best score was beaten.
#[derive(Debug, Serialize, ToSchema)]
pub struct HighestScoreEvent {
    /// The new best score.
    pub highest_score: u32,
}

/// Pushed on the room stream whenever the room document changes.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomUpdatedEvent {
    /// Full room snapshot.
    pub room: RoomSummary,
}

/// Pushed on the room stream whenever the chat log changes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistoryEvent {
    /// The most recent messages, oldest first.
    pub messages: Vec<ChatMessageView>,
}
