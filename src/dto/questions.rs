use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::questions::BankQuestionEntity, dto::format_unix_millis};

/// Payload used to add a question to the admin bank.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateQuestionRequest {
    /// Question text.
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub text: String,
    /// Answer options; at least two.
    #[validate(length(min = 2, message = "a question needs at least two options"))]
    pub options: Vec<String>,
    /// The correct option; must be one of `options`.
    #[validate(length(min = 1, message = "correct answer must not be empty"))]
    pub correct_answer: String,
}

/// Public projection of a bank question.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct BankQuestionView {
    /// Question identifier.
    pub id: String,
    /// Question text.
    pub text: String,
    /// Answer options.
    pub options: Vec<String>,
    /// The correct option.
    pub correct_answer: String,
    /// Creation time, RFC 3339.
    pub created_at: String,
}

impl From<(String, BankQuestionEntity)> for BankQuestionView {
    fn from((id, question): (String, BankQuestionEntity)) -> Self {
        Self {
            id,
            text: question.text,
            options: question.options,
            correct_answer: question.correct_answer,
            created_at: format_unix_millis(question.created_at),
        }
    }
}
