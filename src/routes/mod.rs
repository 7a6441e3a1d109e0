use axum::Router;

use crate::state::SharedState;

/// Chat routes.
pub mod chat;
/// Swagger UI routes.
pub mod docs;
/// Game session routes.
pub mod game;
/// Health routes.
pub mod health;
/// Admin question bank routes.
pub mod questions;
/// Room routes.
pub mod rooms;
/// Server-sent event routes.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(rooms::router())
        .merge(chat::router())
        .merge(game::router())
        .merge(questions::router())
        .merge(sse::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
