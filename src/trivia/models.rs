use serde::Deserialize;

/// Envelope returned by the trivia source.
///
/// `response_code` is a semantic status: any non-zero value is a failure even
/// when the HTTP exchange succeeded.
#[derive(Debug, Clone, Deserialize)]
pub struct TriviaApiResponse {
    /// Source-level status code, `0` on success.
    pub response_code: u8,
    /// Raw question records.
    pub results: Vec<TriviaResult>,
}

/// One raw question record as served by the source.
#[derive(Debug, Clone, Deserialize)]
pub struct TriviaResult {
    /// Category label, HTML-encoded.
    pub category: String,
    /// Question kind reported by the source (`multiple`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Difficulty label.
    pub difficulty: String,
    /// Question text, HTML-encoded.
    pub question: String,
    /// The correct answer, HTML-encoded.
    pub correct_answer: String,
    /// The distractors, HTML-encoded.
    pub incorrect_answers: Vec<String>,
}
