//! Grounding context assembly.

use std::path::Path;

use crate::documents::DocumentTree;
use crate::domain::{truncate_chars, DocumentCandidate};

/// Separator placed between rendered context blocks.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// One document's contribution to the grounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    pub path: String,
    pub content: String,
}

impl ContextBlock {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// The inline citation marker for this block.
    pub fn marker(&self) -> String {
        format!("[File: {}]", self.path)
    }

    /// Renders as `[File: path]` followed by the content, optionally
    /// truncated to `limit` characters.
    pub fn render(&self, limit: Option<usize>) -> String {
        let content = match limit {
            Some(limit) => {
                let cut = truncate_chars(&self.content, limit);
                if cut.len() < self.content.len() {
                    format!("{cut}\n[...]")
                } else {
                    cut.to_string()
                }
            }
            None => self.content.clone(),
        };
        format!("{}\n{}", self.marker(), content)
    }
}

/// Renders blocks joined by [`CONTEXT_SEPARATOR`].
pub fn render_context(blocks: &[ContextBlock], limit: Option<usize>) -> String {
    blocks
        .iter()
        .map(|block| block.render(limit))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Reads the top-ranked documents into context blocks.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_documents: usize,
}

impl ContextAssembler {
    pub fn new(max_documents: usize) -> Self {
        Self { max_documents }
    }

    /// Builds context from the first `max_documents` candidates.
    ///
    /// Content already read during ranking is reused. Documents that fail to
    /// read are logged and left out.
    pub async fn assemble(
        &self,
        documents: &dyn DocumentTree,
        root: &Path,
        ranked: Vec<DocumentCandidate>,
    ) -> Vec<ContextBlock> {
        let mut blocks = Vec::with_capacity(self.max_documents.min(ranked.len()));
        for candidate in ranked.into_iter().take(self.max_documents) {
            let content = match candidate.content {
                Some(content) => content,
                None => match documents.read_text(root, &candidate.path).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(path = %candidate.path, error = %e, "Dropping document from context");
                        continue;
                    }
                },
            };
            blocks.push(ContextBlock::new(candidate.path, content));
        }
        blocks
    }
}
