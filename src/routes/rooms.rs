use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::room::{CreateRoomRequest, RoomSummary},
    error::AppError,
    identity::CurrentUser,
    services::room_service,
    state::SharedState,
};

/// Routes handling room creation, listing, membership, and the game flag.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}/start", post(start_room_game))
}

/// Create a new room owned by the caller.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomSummary),
        (status = 401, description = "Missing identity")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::create_room(&state, &user, payload).await?;
    Ok(Json(summary))
}

/// List every room.
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    responses((status = 200, description = "All rooms", body = [RoomSummary]))
)]
pub async fn list_rooms(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = room_service::list_rooms(&state).await?;
    Ok(Json(rooms))
}

/// Snapshot a single room.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Room snapshot", body = RoomSummary),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::get_room(&state, id).await?;
    Ok(Json(summary))
}

/// Join a room; joining twice is a no-op.
#[utoipa::path(
    post,
    path = "/rooms/{id}/join",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Room after the join", body = RoomSummary),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::join_room(&state, &user, id).await?;
    Ok(Json(summary))
}

/// Raise the room's game flag so members start their sessions.
#[utoipa::path(
    post,
    path = "/rooms/{id}/start",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Room with the game flag raised", body = RoomSummary),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn start_room_game(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::start_room_game(&state, id).await?;
    Ok(Json(summary))
}
