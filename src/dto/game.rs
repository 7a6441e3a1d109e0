use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::{EndReasonDto, QuestionSnapshot, VisibleSessionPhase};

/// Payload used to start (or restart) the caller's game session.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct StartGameRequest {
    /// Room the session is played in, if any. When set, the room's
    /// `gameStarted` flag is cleared again once the session ends.
    #[serde(default)]
    pub room_id: Option<Uuid>,
}

/// Payload carrying a submitted answer.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// The chosen option, verbatim.
    #[validate(length(min = 1, message = "answer must not be empty"))]
    pub answer: String,
}

/// Snapshot of the caller's session returned by the game routes.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SessionView {
    /// Lifecycle phase.
    pub phase: VisibleSessionPhase,
    /// Question currently presented, during play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionSnapshot>,
    /// Current score.
    pub score: u32,
    /// Seconds left on the countdown.
    pub time_left: u8,
    /// Number of questions in the session, `0` before loading completes.
    pub total_questions: usize,
    /// Best score known for the caller.
    pub highest_score: u32,
    /// Why the session ended, present in the game-over phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReasonDto>,
}

/// Best-score payload returned by the score route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HighestScoreResponse {
    /// Best score recorded across all of the caller's sessions.
    pub highest_score: u32,
}
