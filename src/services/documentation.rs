use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Rooms Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::list_rooms,
        crate::routes::rooms::get_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::start_room_game,
        crate::routes::chat::post_message,
        crate::routes::chat::latest_messages,
        crate::routes::game::start_game,
        crate::routes::game::submit_answer,
        crate::routes::game::current_session,
        crate::routes::game::highest_score,
        crate::routes::questions::create_question,
        crate::routes::questions::list_questions,
        crate::routes::questions::delete_question,
        crate::routes::sse::room_stream,
        crate::routes::sse::game_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::RoomSummary,
            crate::dto::chat::PostMessageRequest,
            crate::dto::chat::ChatMessageView,
            crate::dto::game::StartGameRequest,
            crate::dto::game::AnswerRequest,
            crate::dto::game::SessionView,
            crate::dto::game::HighestScoreResponse,
            crate::dto::common::QuestionSnapshot,
            crate::dto::common::VisibleSessionPhase,
            crate::dto::common::EndReasonDto,
            crate::dto::questions::CreateQuestionRequest,
            crate::dto::questions::BankQuestionView,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room creation, membership, and game flag"),
        (name = "chat", description = "Per-room chat stream"),
        (name = "game", description = "Game session engine"),
        (name = "questions", description = "Admin question bank"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
