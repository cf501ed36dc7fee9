//! Embedding-based similarity ranking.

use std::path::Path;

use crate::config::RetrievalSettings;
use crate::documents::DocumentTree;
use crate::domain::DocumentCandidate;
use crate::embedding::{Embedding, EmbeddingProvider};

/// Ranks a bounded sample of documents by cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct SemanticRanker {
    max_candidates: usize,
    fingerprint_chars: usize,
    threshold: f32,
}

impl SemanticRanker {
    pub fn new(max_candidates: usize, fingerprint_chars: usize, threshold: f32) -> Self {
        Self {
            max_candidates,
            fingerprint_chars,
            threshold,
        }
    }

    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self::new(
            settings.max_candidates,
            settings.fingerprint_chars,
            settings.similarity_threshold,
        )
    }

    /// Ranks `paths` against `query`.
    ///
    /// Only the first `max_candidates` paths are scanned, one at a time.
    /// Returns `None` when no vector could be computed or nothing clears the
    /// threshold. Returned candidates keep the content read for their
    /// fingerprint.
    pub async fn rank(
        &self,
        embedder: &dyn EmbeddingProvider,
        documents: &dyn DocumentTree,
        root: &Path,
        query: &str,
        paths: &[String],
    ) -> Option<Vec<DocumentCandidate>> {
        let query_embedding = embedder.embed_query(query).await;
        if query_embedding.is_empty() {
            tracing::debug!(provider = embedder.name(), "No query embedding");
            return None;
        }

        let mut candidates = Vec::new();
        for path in paths.iter().take(self.max_candidates) {
            let mut candidate = DocumentCandidate::new(path.clone());
            match documents.read_text(root, path).await {
                Ok(content) => candidate.content = Some(content),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Skipping unreadable candidate");
                    continue;
                }
            }

            let embedding = embedder
                .embed(&candidate.fingerprint(self.fingerprint_chars))
                .await;
            if !embedding.is_empty() {
                candidate.embedding = Some(embedding);
            }
            candidates.push(candidate);
        }

        if candidates.iter().all(|c| c.embedding.is_none()) {
            tracing::debug!("No candidate embeddings");
            return None;
        }

        let ranked = rank_by_similarity(&query_embedding, candidates, self.threshold);
        tracing::debug!(
            matches = ranked.len(),
            threshold = self.threshold,
            "Semantic ranking complete"
        );
        if ranked.is_empty() {
            None
        } else {
            Some(ranked)
        }
    }
}

impl Default for SemanticRanker {
    fn default() -> Self {
        Self::from_settings(&RetrievalSettings::default())
    }
}

/// Scores candidates against `query`, drops those at or below `threshold`,
/// and sorts best first. Ties keep their input order.
pub fn rank_by_similarity(
    query: &Embedding,
    candidates: Vec<DocumentCandidate>,
    threshold: f32,
) -> Vec<DocumentCandidate> {
    let mut ranked: Vec<DocumentCandidate> = candidates
        .into_iter()
        .filter_map(|mut candidate| {
            let score = candidate
                .embedding
                .as_ref()
                .map(|e| query.cosine_similarity(e))?;
            candidate.score = Some(score);
            (score > threshold).then_some(candidate)
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| {
        let a = a.score.unwrap_or_default();
        let b = b.score.unwrap_or_default();
        b.total_cmp(&a)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentError, Result as DocumentResult};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidate(path: &str, values: Vec<f32>) -> DocumentCandidate {
        let mut c = DocumentCandidate::new(path);
        c.embedding = Some(Embedding::new(values));
        c
    }

    fn paths(ranked: &[DocumentCandidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.path.as_str()).collect()
    }

    #[test]
    fn higher_similarity_ranks_first() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let ranked = rank_by_similarity(
            &query,
            vec![
                candidate("b.md", vec![0.6, 0.8]),
                candidate("a.md", vec![0.9, 0.1]),
            ],
            0.3,
        );
        assert_eq!(paths(&ranked), vec!["a.md", "b.md"]);
        assert!(ranked[0].score.unwrap() > ranked[1].score.unwrap());
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let query = Embedding::new(vec![1.0, 1.0]);
        let ranked = rank_by_similarity(
            &query,
            vec![
                candidate("first.md", vec![1.0, 1.0]),
                candidate("second.md", vec![2.0, 2.0]),
                candidate("third.md", vec![3.0, 3.0]),
            ],
            0.3,
        );
        assert_eq!(paths(&ranked), vec!["first.md", "second.md", "third.md"]);
    }

    #[test]
    fn threshold_is_strict() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let ranked = rank_by_similarity(
            &query,
            vec![
                candidate("orthogonal.md", vec![0.0, 1.0]),
                candidate("mismatched.md", vec![1.0, 0.0, 0.0]),
            ],
            0.0,
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn score_equal_to_threshold_is_excluded() {
        let query = Embedding::new(vec![1.0, 0.0]);
        let diagonal = Embedding::new(vec![0.5, 0.866_025_4]);
        let score = query.cosine_similarity(&diagonal);
        assert!((score - 0.5).abs() < 1e-4);

        let at = rank_by_similarity(
            &query,
            vec![candidate("diag.md", diagonal.values().to_vec())],
            score,
        );
        assert!(at.is_empty());

        let below = rank_by_similarity(
            &query,
            vec![candidate("diag.md", diagonal.values().to_vec())],
            score - 1e-4,
        );
        assert_eq!(below.len(), 1);
    }

    /// Embeds text as counts of two marker words.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, text: &str) -> Embedding {
            let text = text.to_lowercase();
            let garden = text.matches("garden").count() as f32;
            let taxes = text.matches("taxes").count() as f32;
            if garden == 0.0 && taxes == 0.0 {
                return Embedding::empty();
            }
            Embedding::new(vec![garden, taxes])
        }
    }

    struct MemoryTree {
        files: HashMap<String, String>,
        reads: AtomicUsize,
    }

    impl MemoryTree {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentTree for MemoryTree {
        async fn list_text_files(&self, _root: &Path) -> DocumentResult<Vec<String>> {
            let mut paths: Vec<String> = self.files.keys().cloned().collect();
            paths.sort();
            Ok(paths)
        }

        async fn read_text(&self, _root: &Path, path: &str) -> DocumentResult<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| DocumentError::NotFound(path.to_string()))
        }
    }

    #[tokio::test]
    async fn ranks_matching_documents() {
        let tree = MemoryTree::new(&[
            ("beds.md", "garden beds and more garden"),
            ("receipts.md", "taxes due in april"),
        ]);
        let paths = tree.list_text_files(Path::new("/")).await.unwrap();

        let ranked = SemanticRanker::default()
            .rank(&KeywordEmbedder, &tree, Path::new("/"), "garden", &paths)
            .await
            .unwrap();

        assert_eq!(paths_of(&ranked), vec!["beds.md"]);
        assert_eq!(
            ranked[0].content.as_deref(),
            Some("garden beds and more garden")
        );
    }

    fn paths_of(ranked: &[DocumentCandidate]) -> Vec<String> {
        ranked.iter().map(|c| c.path.clone()).collect()
    }

    #[tokio::test]
    async fn empty_query_vector_is_no_match() {
        let tree = MemoryTree::new(&[("beds.md", "garden")]);
        let paths = tree.list_text_files(Path::new("/")).await.unwrap();

        let ranked = SemanticRanker::default()
            .rank(&KeywordEmbedder, &tree, Path::new("/"), "hello", &paths)
            .await;

        assert!(ranked.is_none());
        assert_eq!(tree.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scans_at_most_max_candidates() {
        let files: Vec<(String, String)> = (0..5)
            .map(|i| (format!("note{i}.md"), "garden".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
        let tree = MemoryTree::new(&refs);
        let paths = tree.list_text_files(Path::new("/")).await.unwrap();

        let ranked = SemanticRanker::new(2, 1000, 0.3)
            .rank(&KeywordEmbedder, &tree, Path::new("/"), "garden", &paths)
            .await
            .unwrap();

        assert_eq!(paths_of(&ranked), vec!["note0.md", "note1.md"]);
        assert_eq!(tree.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreadable_candidates_are_skipped() {
        let tree = MemoryTree::new(&[("beds.md", "garden")]);
        let paths = vec!["gone.md".to_string(), "beds.md".to_string()];

        let ranked = SemanticRanker::default()
            .rank(&KeywordEmbedder, &tree, Path::new("/"), "garden", &paths)
            .await
            .unwrap();

        assert_eq!(paths_of(&ranked), vec!["beds.md"]);
    }
}
