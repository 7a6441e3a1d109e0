//! Question supplier fetching and normalizing batches from the external
//! trivia source.

/// HTTP client with rate-limit retry.
pub mod client;
/// Wire types of the trivia source.
pub mod models;
/// HTML entity decoding and option shuffling.
pub mod normalize;
#[cfg(test)]
pub mod test_support;

pub use client::{OpenTriviaClient, QuestionSupplier, SupplierError};
