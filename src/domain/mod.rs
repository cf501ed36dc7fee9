//! Domain types for the note query engine.
//!
//! Queries, per-query document candidates, and the answer returned to
//! callers.

mod answer;
mod candidate;
mod query;

pub use answer::{AnswerResult, NOTHING_RELEVANT};
pub use candidate::{truncate_chars, DocumentCandidate};
pub use query::{Query, Turn, TurnRole, DEFAULT_MAX_CONTEXT_DOCUMENTS};
