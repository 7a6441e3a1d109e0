use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::chat::ChatMessageEntity, dto::format_unix_millis};

/// Payload used to post a chat message.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PostMessageRequest {
    /// Message body.
    #[validate(length(min = 1, max = 500, message = "message must be 1-500 characters"))]
    pub text: String,
}

/// Public projection of a chat message.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ChatMessageView {
    /// Message identifier.
    pub id: String,
    /// Message body.
    pub text: String,
    /// Uid of the author.
    pub user_id: String,
    /// Display name of the author at posting time.
    pub username: String,
    /// Server-assigned creation time, RFC 3339.
    pub created_at: String,
}

impl From<(String, ChatMessageEntity)> for ChatMessageView {
    fn from((id, message): (String, ChatMessageEntity)) -> Self {
        Self {
            id,
            text: message.text,
            user_id: message.user_id,
            username: message.username,
            created_at: format_unix_millis(message.created_at),
        }
    }
}
