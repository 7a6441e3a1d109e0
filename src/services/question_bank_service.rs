//! Business logic for the admin-curated question bank.

use crate::{
    dao::{questions::{BankQuestionEntity, QuestionBankRepository}, unix_millis_now},
    dto::questions::{BankQuestionView, CreateQuestionRequest},
    error::ServiceError,
    state::SharedState,
};

/// Add a hand-authored question to the bank.
pub async fn add_question(
    state: &SharedState,
    request: CreateQuestionRequest,
) -> Result<BankQuestionView, ServiceError> {
    if !request.options.contains(&request.correct_answer) {
        return Err(ServiceError::InvalidInput(
            "correct answer must be one of the options".into(),
        ));
    }

    let store = state.require_document_store().await?;
    let repository = QuestionBankRepository::new(store);

    let question = BankQuestionEntity {
        text: request.text,
        options: request.options,
        correct_answer: request.correct_answer,
        created_at: unix_millis_now(),
    };

    let id = repository.add(question.clone()).await?;
    Ok((id, question).into())
}

/// List the whole bank, newest first.
pub async fn list_questions(state: &SharedState) -> Result<Vec<BankQuestionView>, ServiceError> {
    let store = state.require_document_store().await?;
    let repository = QuestionBankRepository::new(store);

    let questions = repository.list_newest_first().await?;
    Ok(questions.into_iter().map(Into::into).collect())
}

/// Remove a question from the bank.
pub async fn delete_question(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let store = state.require_document_store().await?;
    QuestionBankRepository::new(store).delete(id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::AppConfig, dao::memory::MemoryStore, state::AppState,
        trivia::test_support::FakeSupplier,
    };

    use super::*;

    async fn state_with_store() -> crate::state::SharedState {
        let state = AppState::new(AppConfig::default(), Arc::new(FakeSupplier::default()));
        state
            .install_document_store(Arc::new(MemoryStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn rejects_a_correct_answer_outside_the_options() {
        let state = state_with_store().await;

        let err = add_question(
            &state,
            CreateQuestionRequest {
                text: "2 + 2?".into(),
                options: vec!["3".into(), "4".into()],
                correct_answer: "5".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn add_list_delete_round_trip() {
        let state = state_with_store().await;

        let added = add_question(
            &state,
            CreateQuestionRequest {
                text: "2 + 2?".into(),
                options: vec!["3".into(), "4".into()],
                correct_answer: "4".into(),
            },
        )
        .await
        .unwrap();

        let listed = list_questions(&state).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "2 + 2?");

        delete_question(&state, &added.id).await.unwrap();
        assert!(list_questions(&state).await.unwrap().is_empty());
    }
}
