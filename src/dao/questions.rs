//! Repository for the admin-authored question bank at `questions/{id}`.
//!
//! Bank questions are curated by hand and separate from the live trivia feed
//! used during play.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dao::{
    document_store::{CollectionQuery, Direction, DocumentStore, StoredDocument, paths},
    storage::{StorageError, StorageResult},
};

/// Persisted representation of a curated question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BankQuestionEntity {
    /// Question text.
    pub text: String,
    /// Answer options, at least two.
    pub options: Vec<String>,
    /// The correct option; always one of `options`.
    pub correct_answer: String,
    /// Creation timestamp in unix milliseconds.
    pub created_at: i64,
}

fn decode(doc: &StoredDocument) -> StorageResult<(String, BankQuestionEntity)> {
    let entity = serde_json::from_value(doc.data.clone())
        .map_err(|source| StorageError::codec(paths::question(&doc.id), source))?;
    Ok((doc.id.clone(), entity))
}

/// Data access for the question bank.
#[derive(Clone)]
pub struct QuestionBankRepository {
    store: Arc<dyn DocumentStore>,
}

impl QuestionBankRepository {
    /// Wrap the shared document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append a question, returning its assigned id.
    pub async fn add(&self, question: BankQuestionEntity) -> StorageResult<String> {
        let data = serde_json::to_value(&question)
            .map_err(|source| StorageError::codec(paths::QUESTIONS.to_string(), source))?;
        self.store.add_document(paths::QUESTIONS, data).await
    }

    /// List the whole bank, newest first.
    pub async fn list_newest_first(&self) -> StorageResult<Vec<(String, BankQuestionEntity)>> {
        let docs = self
            .store
            .query_collection(
                CollectionQuery::all(paths::QUESTIONS)
                    .order_by("createdAt", Direction::Descending),
            )
            .await?;
        docs.iter().map(decode).collect()
    }

    /// Fetch the first `count` questions in creation order, for bank-backed
    /// quizzes.
    pub async fn first_created(
        &self,
        count: usize,
    ) -> StorageResult<Vec<(String, BankQuestionEntity)>> {
        let docs = self
            .store
            .query_collection(
                CollectionQuery::all(paths::QUESTIONS)
                    .order_by("createdAt", Direction::Ascending)
                    .limit(count),
            )
            .await?;
        docs.iter().map(decode).collect()
    }

    /// Remove a question from the bank.
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.store.delete_document(&paths::question(id)).await
    }
}
