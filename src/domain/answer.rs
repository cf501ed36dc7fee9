//! Answer domain types.

use serde::{Deserialize, Serialize};

/// Message returned when no note is relevant to the question.
pub const NOTHING_RELEVANT: &str = "I couldn't find anything in your notes that answers that. \
Try rephrasing the question, or add a note that covers it.";

/// The result of a query: answer text and the files it cites.
///
/// Every citation appears verbatim inside `answer` as a `[File: <path>]`
/// marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub citations: Vec<String>,
}

impl AnswerResult {
    pub fn new(answer: impl Into<String>, citations: Vec<String>) -> Self {
        Self {
            answer: answer.into(),
            citations,
        }
    }

    /// An answer that cites nothing.
    pub fn uncited(answer: impl Into<String>) -> Self {
        Self::new(answer, Vec::new())
    }

    /// The fixed "nothing relevant" outcome.
    pub fn nothing_relevant() -> Self {
        Self::uncited(NOTHING_RELEVANT)
    }

    /// Whether this is the "nothing relevant" outcome.
    pub fn is_nothing_relevant(&self) -> bool {
        self.citations.is_empty() && self.answer == NOTHING_RELEVANT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_relevant_has_no_citations() {
        let result = AnswerResult::nothing_relevant();
        assert!(result.citations.is_empty());
        assert!(result.is_nothing_relevant());
    }

    #[test]
    fn cited_answer_is_not_nothing_relevant() {
        let result = AnswerResult::new(NOTHING_RELEVANT, vec!["a.md".to_string()]);
        assert!(!result.is_nothing_relevant());
    }
}
