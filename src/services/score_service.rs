//! Read-side access to the caller's best score.

use crate::{
    dao::scores::ScoreGateway,
    dto::game::HighestScoreResponse,
    error::ServiceError,
    identity::UserProfile,
    state::SharedState,
};

/// The caller's best recorded score, `0` when none exists.
pub async fn get_highest(
    state: &SharedState,
    user: &UserProfile,
) -> Result<HighestScoreResponse, ServiceError> {
    let store = state.require_document_store().await?;
    let highest_score = ScoreGateway::new(store).get_highest(&user.uid).await?;
    Ok(HighestScoreResponse { highest_score })
}
