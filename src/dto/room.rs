use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::rooms::RoomEntity, dto::format_unix_millis};

/// Payload used to create a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the room.
    #[validate(length(min = 1, max = 64, message = "room name must be 1-64 characters"))]
    pub name: String,
}

/// Public projection of a room exposed to REST/SSE clients.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct RoomSummary {
    /// Room identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Uid of the creator.
    pub created_by: String,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Joined players in join order.
    pub players: Vec<String>,
    /// Whether a game round is running in this room.
    pub game_started: bool,
}

impl From<(Uuid, RoomEntity)> for RoomSummary {
    fn from((id, room): (Uuid, RoomEntity)) -> Self {
        Self {
            id,
            name: room.name,
            created_by: room.created_by,
            created_at: format_unix_millis(room.created_at),
            players: room.players.into_iter().collect(),
            game_started: room.game_started,
        }
    }
}
