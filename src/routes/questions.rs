use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use axum_valid::Valid;

use crate::{
    dto::questions::{BankQuestionView, CreateQuestionRequest},
    error::AppError,
    identity::CurrentUser,
    services::question_bank_service,
    state::SharedState,
};

/// Routes handling the admin question bank.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/questions", post(create_question).get(list_questions))
        .route("/questions/{id}", delete(delete_question))
}

/// Add a hand-authored question to the bank.
#[utoipa::path(
    post,
    path = "/questions",
    tag = "questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Question added", body = BankQuestionView),
        (status = 400, description = "Correct answer not among the options"),
        (status = 401, description = "Missing identity")
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    Valid(Json(payload)): Valid<Json<CreateQuestionRequest>>,
) -> Result<Json<BankQuestionView>, AppError> {
    let question = question_bank_service::add_question(&state, payload).await?;
    Ok(Json(question))
}

/// List the whole bank, newest first.
#[utoipa::path(
    get,
    path = "/questions",
    tag = "questions",
    responses((status = 200, description = "All bank questions", body = [BankQuestionView]))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<BankQuestionView>>, AppError> {
    let questions = question_bank_service::list_questions(&state).await?;
    Ok(Json(questions))
}

/// Remove a question from the bank.
#[utoipa::path(
    delete,
    path = "/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 204, description = "Question removed"),
        (status = 401, description = "Missing identity")
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, AppError> {
    question_bank_service::delete_question(&state, &id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
