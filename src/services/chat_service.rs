//! Business logic for the per-room chat stream.

use uuid::Uuid;

use crate::{
    dao::{
        chat::{ChatMessageEntity, ChatRepository},
        rooms::RoomRepository,
        unix_millis_now,
    },
    dto::chat::{ChatMessageView, PostMessageRequest},
    error::ServiceError,
    identity::UserProfile,
    state::SharedState,
};

/// Append a message to the room's log with a server-assigned timestamp.
pub async fn post_message(
    state: &SharedState,
    user: &UserProfile,
    room_id: Uuid,
    request: PostMessageRequest,
) -> Result<ChatMessageView, ServiceError> {
    let store = state.require_document_store().await?;

    if RoomRepository::new(store.clone()).find(room_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
    }

    let message = ChatMessageEntity {
        text: request.text,
        user_id: user.uid.clone(),
        username: user.username().to_string(),
        created_at: unix_millis_now(),
    };

    let id = ChatRepository::new(store).post(room_id, message.clone()).await?;
    Ok((id, message).into())
}

/// The most recent messages of a room, oldest first for display.
///
/// Retrieval happens newest-first under the configured history limit; the
/// result is reversed before it leaves the service.
pub async fn latest_messages(
    state: &SharedState,
    room_id: Uuid,
) -> Result<Vec<ChatMessageView>, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = ChatRepository::new(store);

    let mut messages = repository
        .latest(room_id, state.config().chat.history_limit)
        .await?;
    messages.reverse();

    Ok(messages.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        dao::memory::MemoryStore,
        services::room_service,
        state::AppState,
        trivia::test_support::FakeSupplier,
    };

    use super::*;

    fn user(uid: &str) -> UserProfile {
        UserProfile {
            uid: uid.into(),
            display_name: Some(format!("name-{uid}")),
            email: None,
        }
    }

    async fn state_with_store() -> crate::state::SharedState {
        let state = AppState::new(AppConfig::default(), Arc::new(FakeSupplier::default()));
        state
            .install_document_store(Arc::new(MemoryStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first() {
        let state = state_with_store().await;
        let room = room_service::create_room(
            &state,
            &user("u1"),
            crate::dto::room::CreateRoomRequest { name: "lobby".into() },
        )
        .await
        .unwrap();

        for text in ["first", "second", "third"] {
            post_message(
                &state,
                &user("u1"),
                room.id,
                PostMessageRequest { text: text.into() },
            )
            .await
            .unwrap();
        }

        let messages = latest_messages(&state, room.id).await.unwrap();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn posting_to_a_missing_room_fails() {
        let state = state_with_store().await;
        let err = post_message(
            &state,
            &user("u1"),
            Uuid::new_v4(),
            PostMessageRequest { text: "hi".into() },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
