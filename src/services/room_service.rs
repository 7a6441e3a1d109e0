//! Business logic for room creation, membership, and the shared game flag.

use uuid::Uuid;

use crate::{
    dao::{rooms::{RoomEntity, RoomRepository}, unix_millis_now},
    dto::room::{CreateRoomRequest, RoomSummary},
    error::ServiceError,
    identity::UserProfile,
    state::SharedState,
};

/// Create a room owned by the caller.
pub async fn create_room(
    state: &SharedState,
    user: &UserProfile,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = RoomRepository::new(store);

    let room = RoomEntity::new(request.name, user.uid.clone(), unix_millis_now());
    let id = repository.create(room.clone()).await?;

    Ok((id, room).into())
}

/// List every room.
pub async fn list_rooms(state: &SharedState) -> Result<Vec<RoomSummary>, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = RoomRepository::new(store);

    let rooms = repository.list().await?;
    Ok(rooms.into_iter().map(Into::into).collect())
}

/// Snapshot a single room.
pub async fn get_room(state: &SharedState, id: Uuid) -> Result<RoomSummary, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = RoomRepository::new(store);

    let room = repository
        .find(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{id}` not found")))?;
    Ok((id, room).into())
}

/// Add the caller to the room's player set. Joining twice is a no-op.
pub async fn join_room(
    state: &SharedState,
    user: &UserProfile,
    id: Uuid,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = RoomRepository::new(store);

    let room = repository
        .join(id, &user.uid)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{id}` not found")))?;
    Ok((id, room).into())
}

/// Raise the room's `gameStarted` flag so every member's client starts a
/// session.
pub async fn start_room_game(state: &SharedState, id: Uuid) -> Result<RoomSummary, ServiceError> {
    set_game_started(state, id, true).await
}

/// Clear the room's `gameStarted` flag once a session in the room ended.
pub async fn end_room_game(state: &SharedState, id: Uuid) -> Result<RoomSummary, ServiceError> {
    set_game_started(state, id, false).await
}

async fn set_game_started(
    state: &SharedState,
    id: Uuid,
    started: bool,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = RoomRepository::new(store);

    if repository.find(id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{id}` not found")));
    }

    repository.set_game_started(id, started).await?;
    get_room(state, id).await
}
