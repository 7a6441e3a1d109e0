use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{AnswerRequest, HighestScoreResponse, SessionView, StartGameRequest},
    error::AppError,
    identity::CurrentUser,
    services::{game_service, score_service},
    state::SharedState,
};

/// Routes driving the caller's game session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game/start", post(start_game))
        .route("/game/answer", post(submit_answer))
        .route("/game", get(current_session))
        .route("/score", get(highest_score))
}

/// Start (or restart) the caller's session.
#[utoipa::path(
    post,
    path = "/game/start",
    tag = "game",
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Session running", body = SessionView),
        (status = 401, description = "Missing identity"),
        (status = 409, description = "A load is already in flight"),
        (status = 502, description = "The trivia source failed")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(payload)): Valid<Json<StartGameRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let view = game_service::start_session(&state, &user, payload).await?;
    Ok(Json(view))
}

/// Submit an answer for the current question.
#[utoipa::path(
    post,
    path = "/game/answer",
    tag = "game",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Session after the answer", body = SessionView),
        (status = 401, description = "Missing identity"),
        (status = 409, description = "No running session")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let view = game_service::submit_answer(&state, &user, payload).await?;
    Ok(Json(view))
}

/// Snapshot the caller's session.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current session view", body = SessionView),
        (status = 401, description = "Missing identity")
    )
)]
pub async fn current_session(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Json<SessionView> {
    Json(game_service::current_session(&state, &user).await)
}

/// The caller's best recorded score.
#[utoipa::path(
    get,
    path = "/score",
    tag = "game",
    responses(
        (status = 200, description = "Best score", body = HighestScoreResponse),
        (status = 401, description = "Missing identity")
    )
)]
pub async fn highest_score(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<HighestScoreResponse>, AppError> {
    let response = score_service::get_highest(&state, &user).await?;
    Ok(Json(response))
}
