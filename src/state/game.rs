use std::collections::HashMap;

use crate::state::{
    clock::SessionClock,
    state_machine::EndReason,
};

/// A playable multiple-choice question.
///
/// Immutable once fetched and owned exclusively by the active session. The
/// `id` is session-local (`q0`, `q1`, ...) and must not be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Session-local identifier.
    pub id: String,
    /// Category label.
    pub category: String,
    /// Question text.
    pub text: String,
    /// Answer options in display order; at least two.
    pub options: Vec<String>,
    /// The correct option; always one of `options`.
    pub correct_answer: String,
}

/// What a submitted answer did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct answer with more questions left; the clock was reset.
    Advanced {
        /// Index of the question now current.
        index: usize,
    },
    /// The answer ended the session.
    Finished {
        /// Why the session ended.
        reason: EndReason,
        /// Score at the moment the session ended.
        final_score: u32,
    },
    /// Submission arrived after the session ended or past the last question;
    /// nothing changed.
    Ignored,
}

/// Mutable state of one playthrough, owned by the session engine.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Questions for this playthrough, in play order.
    pub questions: Vec<Question>,
    /// Index of the question currently shown.
    pub current_index: usize,
    /// Questions answered correctly so far.
    pub score: u32,
    /// Per-question countdown.
    pub clock: SessionClock,
    /// Latched once the session ended; no path unsets it.
    pub game_over: bool,
}

impl GameSession {
    /// Start a playthrough over `questions` with a `question_duration`-unit
    /// countdown per question.
    pub fn new(questions: Vec<Question>, question_duration: u8) -> Self {
        Self {
            questions,
            current_index: 0,
            score: 0,
            clock: SessionClock::new(question_duration),
            game_over: false,
        }
    }

    /// The question currently presented, if any.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Units left on the countdown.
    pub fn time_left(&self) -> u8 {
        self.clock.remaining()
    }

    /// Evaluate a submitted answer.
    ///
    /// A correct answer scores one point and either advances to the next
    /// question (resetting the clock) or, on the last question, ends the
    /// session with the point counted. Any wrong answer ends the session
    /// immediately at the current score. Submissions after game over or past
    /// the end of the question list are ignored.
    pub fn answer(&mut self, answer: &str) -> AnswerOutcome {
        if self.game_over || self.current_index >= self.questions.len() {
            return AnswerOutcome::Ignored;
        }

        if answer != self.questions[self.current_index].correct_answer {
            return AnswerOutcome::Finished {
                reason: EndReason::WrongAnswer,
                final_score: self.finish(),
            };
        }

        self.score += 1;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.clock.reset();
            AnswerOutcome::Advanced {
                index: self.current_index,
            }
        } else {
            AnswerOutcome::Finished {
                reason: EndReason::Completed,
                final_score: self.finish(),
            }
        }
    }

    /// End the session because the countdown expired.
    ///
    /// The current question is never credited. Returns the final score, or
    /// `None` when the session was already over (the expiry lost the race
    /// against another ending path and must be dropped).
    pub fn expire(&mut self) -> Option<u32> {
        if self.game_over {
            return None;
        }
        Some(self.finish())
    }

    fn finish(&mut self) -> u32 {
        self.game_over = true;
        self.clock.cancel();
        self.score
    }
}

/// Count how many questions were answered correctly, keyed by question id.
///
/// Used for bank-backed quizzes where all answers are collected up front.
pub fn calculate_score(answers: &HashMap<String, String>, questions: &[Question]) -> u32 {
    questions
        .iter()
        .filter(|question| {
            answers
                .get(&question.id)
                .is_some_and(|answer| *answer == question.correct_answer)
        })
        .count() as u32
}
