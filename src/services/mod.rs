/// Per-room chat operations.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Core session engine and countdown driver.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Admin question bank operations.
pub mod question_bank_service;
/// Room membership and game flag operations.
pub mod room_service;
/// Best-score reads.
pub mod score_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor.
pub mod storage_supervisor;
