//! Query domain types.
//!
//! A query is immutable once built: the question text, the conversation so
//! far, and how many documents may back the answer.

use serde::{Deserialize, Serialize};

/// Default number of documents assembled into the grounding context.
pub const DEFAULT_MAX_CONTEXT_DOCUMENTS: usize = 5;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single prior turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// A question asked against the note corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The raw question text.
    pub text: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
    /// Upper bound on documents handed to synthesis.
    #[serde(default = "default_max_context_documents")]
    pub max_context_documents: usize,
}

fn default_max_context_documents() -> usize {
    DEFAULT_MAX_CONTEXT_DOCUMENTS
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            history: Vec::new(),
            max_context_documents: DEFAULT_MAX_CONTEXT_DOCUMENTS,
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_max_context_documents(mut self, max: usize) -> Self {
        self.max_context_documents = max;
        self
    }

    /// Text used for retrieval: the question plus the most recent user turns.
    ///
    /// Follow-up questions like "and the second one?" carry little signal on
    /// their own, so the last `recent_turns` user turns are appended.
    pub fn retrieval_text(&self, recent_turns: usize) -> String {
        let mut recent: Vec<&str> = self
            .history
            .iter()
            .rev()
            .filter(|turn| turn.role == TurnRole::User)
            .take(recent_turns)
            .map(|turn| turn.text.trim())
            .filter(|text| !text.is_empty())
            .collect();
        recent.reverse();

        if recent.is_empty() {
            return self.text.clone();
        }

        format!("{} {}", self.text, recent.join(" "))
    }
}
