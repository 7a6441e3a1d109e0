//! Test doubles for the question supplier.

use std::{collections::VecDeque, sync::Mutex};

use futures::future::BoxFuture;

use crate::{
    state::game::Question,
    trivia::client::{QuestionSupplier, SupplierError},
};

/// Supplier returning scripted batches; an exhausted script yields empty
/// batches.
#[derive(Default)]
pub struct FakeSupplier {
    batches: Mutex<VecDeque<Result<Vec<Question>, SupplierError>>>,
}

impl FakeSupplier {
    /// Script the outcomes of successive `fetch` calls.
    pub fn with_batches(batches: Vec<Result<Vec<Question>, SupplierError>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }

    /// A minimal two-option question whose correct answer is `correct`.
    pub fn question(id: &str, correct: &str) -> Question {
        Question {
            id: id.into(),
            category: "General".into(),
            text: format!("{id}?"),
            options: vec![correct.to_string(), "wrong".into()],
            correct_answer: correct.into(),
        }
    }

    /// A batch of `count` questions all answered correctly by `correct`.
    pub fn batch(count: usize, correct: &str) -> Vec<Question> {
        (0..count)
            .map(|index| Self::question(&format!("q{index}"), correct))
            .collect()
    }
}

impl QuestionSupplier for FakeSupplier {
    fn fetch(&self, _count: usize) -> BoxFuture<'static, Result<Vec<Question>, SupplierError>> {
        let next = self
            .batches
            .lock()
            .expect("fake supplier lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        Box::pin(async move { next })
    }
}
