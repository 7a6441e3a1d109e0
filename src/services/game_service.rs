//! Session engine: question loading, answer evaluation, the countdown
//! driver, and end-of-game persistence.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::{
    dao::scores::ScoreGateway,
    dto::{
        common::QuestionSnapshot,
        game::{AnswerRequest, SessionView, StartGameRequest},
    },
    error::ServiceError,
    identity::UserProfile,
    services::{room_service, sse_events},
    state::{
        SessionCell, SharedState,
        clock::ClockTick,
        game::{AnswerOutcome, GameSession},
        state_machine::{EndReason, SessionEvent, SessionPhase},
    },
};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Start (or restart) the caller's session.
///
/// The lifecycle machine moves to `Loading` before the fetch and to
/// `InProgress` or `Failed` once the supplier resolves. A restart while a
/// fetch is in flight is rejected; a restart from `Failed` or `GameOver`
/// resets all session state.
pub async fn start_session(
    state: &SharedState,
    user: &UserProfile,
    request: StartGameRequest,
) -> Result<SessionView, ServiceError> {
    let store = state.require_document_store().await?;
    let slot = state.session(&user.uid);

    let generation = {
        let mut cell = slot.lock().await;
        cell.machine.apply(SessionEvent::StartRequested)?;
        cell.generation += 1;
        cell.game = None;
        cell.room_id = request.room_id;
        sse_events::broadcast_session_loading(
            state,
            &user.uid,
            state.config().trivia.question_count,
        );
        cell.generation
    };

    // A failed read only loses the cached comparison basis for this session.
    let highest = match ScoreGateway::new(store).get_highest(&user.uid).await {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, uid = %user.uid, "failed to read highest score; assuming 0");
            0
        }
    };

    let fetched = state
        .supplier()
        .fetch(state.config().trivia.question_count)
        .await;

    let mut cell = slot.lock().await;
    if cell.generation != generation {
        return Err(ServiceError::InvalidState(
            "session was restarted while loading".into(),
        ));
    }
    cell.highest_score = highest;

    match fetched {
        Ok(questions) if !questions.is_empty() => {
            cell.machine.apply(SessionEvent::QuestionsLoaded)?;
            let game = GameSession::new(questions, state.config().game.question_duration);
            sse_events::broadcast_session_question(state, &user.uid, &game);
            cell.game = Some(game);
            spawn_session_clock(state.clone(), user.uid.clone(), generation);
            Ok(view_of(&cell))
        }
        Ok(_) => {
            cell.machine.apply(SessionEvent::LoadFailed)?;
            let message = "trivia source returned no questions";
            sse_events::broadcast_session_failed(state, &user.uid, message);
            Err(ServiceError::InvalidState(message.into()))
        }
        Err(err) => {
            cell.machine.apply(SessionEvent::LoadFailed)?;
            sse_events::broadcast_session_failed(state, &user.uid, &err.to_string());
            Err(ServiceError::Supplier(err))
        }
    }
}

/// Evaluate a submitted answer against the caller's running session.
///
/// Submissions after game over are no-ops and return the unchanged view.
pub async fn submit_answer(
    state: &SharedState,
    user: &UserProfile,
    request: AnswerRequest,
) -> Result<SessionView, ServiceError> {
    let slot = state.session(&user.uid);
    let mut cell = slot.lock().await;

    match cell.machine.phase() {
        SessionPhase::InProgress => {}
        SessionPhase::GameOver(_) => return Ok(view_of(&cell)),
        other => {
            return Err(ServiceError::InvalidState(format!(
                "no running session (phase {other:?})"
            )));
        }
    }

    let Some(game) = cell.game.as_mut() else {
        return Err(ServiceError::InvalidState(
            "session has no loaded questions".into(),
        ));
    };

    match game.answer(&request.answer) {
        AnswerOutcome::Advanced { .. } => {
            sse_events::broadcast_session_question(state, &user.uid, game);
        }
        AnswerOutcome::Finished {
            reason,
            final_score,
        } => {
            finalize_session(state, &user.uid, &mut cell, reason, final_score).await;
        }
        AnswerOutcome::Ignored => {}
    }

    Ok(view_of(&cell))
}

/// Snapshot the caller's session.
pub async fn current_session(state: &SharedState, user: &UserProfile) -> SessionView {
    let slot = state.session(&user.uid);
    let cell = slot.lock().await;
    view_of(&cell)
}

/// Complete a `GameOver` transition: persist a new best score, notify the
/// owning room, and emit the single ended event.
///
/// When both ending paths race within the same tick, the state machine
/// rejects the second `Finish` and the loser returns without side effects.
async fn finalize_session(
    state: &SharedState,
    uid: &str,
    cell: &mut SessionCell,
    reason: EndReason,
    final_score: u32,
) {
    if let Err(err) = cell.machine.apply(SessionEvent::Finish(reason)) {
        warn!(uid, error = %err, "dropping duplicate session ending");
        return;
    }

    if final_score > cell.highest_score {
        match state.document_store().await {
            Some(store) => {
                // The cached best is bumped as soon as the write is issued;
                // a failed write is logged and accepted, never rolled back.
                let gateway = ScoreGateway::new(store);
                let write = gateway.set_highest_if_greater(uid, final_score);
                cell.highest_score = final_score;
                sse_events::broadcast_highest_score(state, uid, final_score);
                if let Err(err) = write.await {
                    warn!(error = %err, uid, "failed to persist highest score");
                }
            }
            None => {
                cell.highest_score = final_score;
                warn!(uid, "degraded mode: highest score not persisted");
            }
        }
    }

    if let Some(room_id) = cell.room_id {
        if let Err(err) = room_service::end_room_game(state, room_id).await {
            warn!(error = %err, %room_id, "failed to clear the room's game flag");
        }
    }

    sse_events::broadcast_session_ended(state, uid, final_score, cell.highest_score, reason);
    info!(uid, final_score, ?reason, "session ended");
}

/// Drive the session countdown once per second until the session ends.
///
/// The task carries the generation it was started for; a restart bumps the
/// generation, so a stale task stops without touching the new session.
fn spawn_session_clock(state: SharedState, uid: String, generation: u64) {
    tokio::spawn(async move {
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a fresh interval completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let slot = state.session(&uid);
            let mut cell = slot.lock().await;

            if cell.generation != generation {
                break;
            }
            if !matches!(cell.machine.phase(), SessionPhase::InProgress) {
                break;
            }

            let tick = match cell.game.as_mut() {
                Some(game) => game.clock.tick(),
                None => break,
            };

            match tick {
                ClockTick::Running { remaining } => {
                    sse_events::broadcast_session_tick(&state, &uid, remaining);
                }
                ClockTick::Expired => {
                    if let Some(final_score) = cell.game.as_mut().and_then(GameSession::expire) {
                        finalize_session(&state, &uid, &mut cell, EndReason::TimeExpired, final_score)
                            .await;
                    }
                    break;
                }
                ClockTick::Idle => break,
            }
        }
    });
}

fn view_of(cell: &SessionCell) -> SessionView {
    let phase = cell.machine.phase();
    let end_reason = match &phase {
        SessionPhase::GameOver(reason) => Some((*reason).into()),
        _ => None,
    };

    let (question, score, time_left, total_questions) = match (&phase, cell.game.as_ref()) {
        (SessionPhase::InProgress, Some(game)) => (
            QuestionSnapshot::current(game),
            game.score,
            game.time_left(),
            game.questions.len(),
        ),
        (_, Some(game)) => (None, game.score, game.time_left(), game.questions.len()),
        _ => (None, 0, 0, 0),
    };

    SessionView {
        phase: (&phase).into(),
        question,
        score,
        time_left,
        total_questions,
        highest_score: cell.highest_score,
        end_reason,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        dao::{memory::MemoryStore, rooms::{RoomEntity, RoomRepository}, scores::ScoreGateway},
        dto::common::VisibleSessionPhase,
        state::AppState,
        trivia::{client::SupplierError, test_support::FakeSupplier},
    };

    use super::*;

    fn player() -> UserProfile {
        UserProfile {
            uid: "u1".into(),
            display_name: Some("Ada".into()),
            email: None,
        }
    }

    async fn state_with(supplier: FakeSupplier) -> (SharedState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(AppConfig::default(), Arc::new(supplier));
        state.install_document_store(store.clone()).await;
        (state, store)
    }

    fn answer(text: &str) -> AnswerRequest {
        AnswerRequest {
            answer: text.into(),
        }
    }

    #[tokio::test]
    async fn correct_correct_wrong_ends_with_score_two_and_persists() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(3, "ok"))]);
        let (state, store) = state_with(supplier).await;
        let user = player();

        let view = start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        assert_eq!(view.phase, VisibleSessionPhase::InProgress);
        assert_eq!(view.total_questions, 3);

        submit_answer(&state, &user, answer("ok")).await.unwrap();
        submit_answer(&state, &user, answer("ok")).await.unwrap();
        let ended = submit_answer(&state, &user, answer("nope")).await.unwrap();

        assert_eq!(ended.phase, VisibleSessionPhase::GameOver);
        assert_eq!(ended.score, 2);
        assert_eq!(ended.highest_score, 2);

        let stored = ScoreGateway::new(store).get_highest(&user.uid).await.unwrap();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn lower_final_score_leaves_stored_best_alone() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(3, "ok"))]);
        let (state, store) = state_with(supplier).await;
        let user = player();

        let gateway = ScoreGateway::new(store.clone());
        gateway.set_highest_if_greater(&user.uid, 5).await.unwrap();

        start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        submit_answer(&state, &user, answer("ok")).await.unwrap();
        let ended = submit_answer(&state, &user, answer("nope")).await.unwrap();

        assert_eq!(ended.score, 1);
        assert_eq!(ended.highest_score, 5);
        assert_eq!(gateway.get_highest(&user.uid).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn answers_after_game_over_are_no_ops() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(2, "ok"))]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        submit_answer(&state, &user, answer("nope")).await.unwrap();

        let after = submit_answer(&state, &user, answer("ok")).await.unwrap();
        assert_eq!(after.phase, VisibleSessionPhase::GameOver);
        assert_eq!(after.score, 0);
    }

    #[tokio::test]
    async fn completing_every_question_credits_the_last_one() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(2, "ok"))]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        submit_answer(&state, &user, answer("ok")).await.unwrap();
        let ended = submit_answer(&state, &user, answer("ok")).await.unwrap();

        assert_eq!(ended.phase, VisibleSessionPhase::GameOver);
        assert_eq!(ended.score, 2);
    }

    #[tokio::test]
    async fn supplier_failure_leaves_an_inert_retryable_session() {
        let supplier = FakeSupplier::with_batches(vec![
            Err(SupplierError::ResponseCode { code: 2 }),
            Ok(FakeSupplier::batch(1, "ok")),
        ]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        let err = start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Supplier(_)));

        let view = current_session(&state, &user).await;
        assert_eq!(view.phase, VisibleSessionPhase::Failed);

        // Submissions are rejected while inert.
        let err = submit_answer(&state, &user, answer("ok")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // An external retry restarts the load from scratch.
        let view = start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        assert_eq!(view.phase, VisibleSessionPhase::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_with_no_answer_ends_at_score_zero() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(1, "ok"))]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        let view = start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        assert_eq!(view.time_left, 10);

        tokio::time::sleep(Duration::from_secs(11)).await;

        let view = current_session(&state, &user).await;
        assert_eq!(view.phase, VisibleSessionPhase::GameOver);
        assert_eq!(view.score, 0);
        assert_eq!(view.time_left, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_clears_the_bound_room_flag() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(1, "ok"))]);
        let (state, store) = state_with(supplier).await;
        let user = player();

        let rooms = RoomRepository::new(store);
        let room_id = rooms
            .create(RoomEntity::new("lobby".into(), user.uid.clone(), 0))
            .await
            .unwrap();
        rooms.set_game_started(room_id, true).await.unwrap();

        start_session(
            &state,
            &user,
            StartGameRequest {
                room_id: Some(room_id),
            },
        )
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;

        let room = rooms.find(room_id).await.unwrap().unwrap();
        assert!(!room.game_started);
    }

    #[tokio::test(start_paused = true)]
    async fn answering_resets_the_countdown() {
        let supplier = FakeSupplier::with_batches(vec![Ok(FakeSupplier::batch(2, "ok"))]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        let view = current_session(&state, &user).await;
        assert!(view.time_left < 10);

        let view = submit_answer(&state, &user, answer("ok")).await.unwrap();
        assert_eq!(view.time_left, 10);
        assert_eq!(view.phase, VisibleSessionPhase::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_clock_task_cannot_touch_a_restarted_session() {
        let supplier = FakeSupplier::with_batches(vec![
            Ok(FakeSupplier::batch(1, "ok")),
            Ok(FakeSupplier::batch(1, "ok")),
        ]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Finish and restart; the first session's clock task is now stale.
        submit_answer(&state, &user, answer("nope")).await.unwrap();
        start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let view = current_session(&state, &user).await;
        assert_eq!(view.phase, VisibleSessionPhase::InProgress);
        assert_eq!(view.time_left, 5);
    }

    #[tokio::test]
    async fn empty_batches_fail_the_load() {
        let supplier = FakeSupplier::with_batches(vec![Ok(Vec::new())]);
        let (state, _) = state_with(supplier).await;
        let user = player();

        let err = start_session(&state, &user, StartGameRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(
            current_session(&state, &user).await.phase,
            VisibleSessionPhase::Failed
        );
    }
}
