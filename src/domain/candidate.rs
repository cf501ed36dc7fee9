//! Per-query document candidates.

use crate::embedding::Embedding;

/// A document considered for a single query.
///
/// Created when the corpus is enumerated and dropped when the query
/// completes. Never persisted.
#[derive(Debug, Clone)]
pub struct DocumentCandidate {
    /// Path relative to the corpus root, `/`-separated.
    pub path: String,
    /// Text content, read lazily.
    pub content: Option<String>,
    /// Embedding of the document fingerprint, if one could be computed.
    pub embedding: Option<Embedding>,
    /// Relevance score assigned by a ranker.
    pub score: Option<f32>,
}

impl DocumentCandidate {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            embedding: None,
            score: None,
        }
    }

    /// Text embedded for similarity: the path followed by the first
    /// `max_chars` characters of content.
    pub fn fingerprint(&self, max_chars: usize) -> String {
        let content = self.content.as_deref().unwrap_or_default();
        format!("{}\n{}", self.path, truncate_chars(content, max_chars))
    }
}

/// Truncates to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
