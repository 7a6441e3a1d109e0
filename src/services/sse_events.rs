use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        common::QuestionSnapshot,
        sse::{
            HighestScoreEvent, ServerEvent, SessionEndedEvent, SessionFailedEvent,
            SessionLoadingEvent, SessionQuestionEvent, SessionTickEvent,
        },
    },
    state::{SharedState, game::GameSession, state_machine::EndReason},
};

const EVENT_SESSION_LOADING: &str = "session.loading";
const EVENT_SESSION_QUESTION: &str = "session.question";
const EVENT_SESSION_TICK: &str = "session.tick";
const EVENT_SESSION_ENDED: &str = "session.ended";
const EVENT_SESSION_FAILED: &str = "session.failed";
const EVENT_HIGHEST_SCORE: &str = "score.highest";

/// Broadcast that the player's session started fetching questions.
pub fn broadcast_session_loading(state: &SharedState, uid: &str, question_count: usize) {
    let payload = SessionLoadingEvent { question_count };
    send_session_event(state, uid, EVENT_SESSION_LOADING, &payload);
}

/// Broadcast the question now presented, with the fresh countdown.
pub fn broadcast_session_question(state: &SharedState, uid: &str, game: &GameSession) {
    let Some(question) = QuestionSnapshot::current(game) else {
        return;
    };
    let payload = SessionQuestionEvent {
        question,
        score: game.score,
        time_left: game.time_left(),
    };
    send_session_event(state, uid, EVENT_SESSION_QUESTION, &payload);
}

/// Broadcast a countdown tick.
pub fn broadcast_session_tick(state: &SharedState, uid: &str, time_left: u8) {
    let payload = SessionTickEvent { time_left };
    send_session_event(state, uid, EVENT_SESSION_TICK, &payload);
}

/// Broadcast the end of a session. Sent exactly once per playthrough.
pub fn broadcast_session_ended(
    state: &SharedState,
    uid: &str,
    final_score: u32,
    highest_score: u32,
    reason: EndReason,
) {
    let payload = SessionEndedEvent {
        final_score,
        highest_score,
        reason: reason.into(),
    };
    send_session_event(state, uid, EVENT_SESSION_ENDED, &payload);
}

/// Broadcast that the question fetch failed and the session went inert.
pub fn broadcast_session_failed(state: &SharedState, uid: &str, message: &str) {
    let payload = SessionFailedEvent {
        message: message.to_string(),
    };
    send_session_event(state, uid, EVENT_SESSION_FAILED, &payload);
}

/// Broadcast a new personal best.
pub fn broadcast_highest_score(state: &SharedState, uid: &str, highest_score: u32) {
    let payload = HighestScoreEvent { highest_score };
    send_session_event(state, uid, EVENT_HIGHEST_SCORE, &payload);
}

/// Send a human-readable info message onto the user's session stream.
pub fn broadcast_session_info(state: &SharedState, uid: &str, message: &str) {
    state.session_hub(uid).broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

fn send_session_event(state: &SharedState, uid: &str, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.session_hub(uid).broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize session SSE payload"),
    }
}
