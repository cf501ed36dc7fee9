//! Candidate ranking and context assembly.
//!
//! Semantic ranking embeds a bounded sample of notes and keeps those above a
//! similarity threshold. When it finds nothing, [`LexicalRanker`] scores paths
//! by keyword matches instead.

mod context;
mod lexical;
mod ranker;

pub use context::{render_context, ContextAssembler, ContextBlock, CONTEXT_SEPARATOR};
pub use lexical::{keywords, LexicalRanker};
pub use ranker::{rank_by_similarity, SemanticRanker};
