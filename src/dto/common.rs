use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    game::{GameSession, Question},
    state_machine::{EndReason, SessionPhase},
};

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// No session running.
    Idle,
    /// Questions are being fetched.
    Loading,
    /// The player is answering questions.
    InProgress,
    /// The session ended.
    GameOver,
    /// The question fetch failed; a retry is possible.
    Failed,
}

impl From<&SessionPhase> for VisibleSessionPhase {
    fn from(value: &SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => VisibleSessionPhase::Idle,
            SessionPhase::Loading => VisibleSessionPhase::Loading,
            SessionPhase::InProgress => VisibleSessionPhase::InProgress,
            SessionPhase::GameOver(_) => VisibleSessionPhase::GameOver,
            SessionPhase::Failed => VisibleSessionPhase::Failed,
        }
    }
}

/// Why a session ended, as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReasonDto {
    /// Every question answered correctly.
    Completed,
    /// An incorrect answer ended the game.
    WrongAnswer,
    /// The countdown expired.
    TimeExpired,
}

impl From<EndReason> for EndReasonDto {
    fn from(value: EndReason) -> Self {
        match value {
            EndReason::Completed => EndReasonDto::Completed,
            EndReason::WrongAnswer => EndReasonDto::WrongAnswer,
            EndReason::TimeExpired => EndReasonDto::TimeExpired,
        }
    }
}

/// Snapshot of the question currently presented to a player.
///
/// The correct answer is deliberately absent.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct QuestionSnapshot {
    /// Session-local question id.
    pub id: String,
    /// Category label.
    pub category: String,
    /// Question text.
    pub text: String,
    /// Options in display order.
    pub options: Vec<String>,
    /// Zero-based index of this question in the session.
    pub index: usize,
    /// Number of questions in the session.
    pub total: usize,
}

impl QuestionSnapshot {
    /// Snapshot the session's current question, if one is presented.
    pub fn current(session: &GameSession) -> Option<Self> {
        let question = session.current_question()?;
        Some(Self::from_question(
            question,
            session.current_index,
            session.questions.len(),
        ))
    }

    fn from_question(question: &Question, index: usize, total: usize) -> Self {
        Self {
            id: question.id.clone(),
            category: question.category.clone(),
            text: question.text.clone(),
            options: question.options.clone(),
            index,
            total,
        }
    }
}
