//! Keyword fallback ranking over document paths.

use crate::domain::DocumentCandidate;

/// Points for the first occurrence of a keyword in a path.
const MATCH_POINTS: f32 = 10.0;
/// Points for each further occurrence of the same keyword.
const REPEAT_POINTS: f32 = 2.0;

/// Lowercase words longer than two characters, deduplicated in query order.
pub fn keywords(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
    {
        if !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

/// Scores paths by how often query keywords appear in them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalRanker;

impl LexicalRanker {
    pub fn new() -> Self {
        Self
    }

    /// Ranks `paths` best first. Paths with no keyword match are dropped.
    pub fn rank(&self, query: &str, paths: &[String]) -> Vec<DocumentCandidate> {
        let keywords = keywords(query);
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<DocumentCandidate> = paths
            .iter()
            .filter_map(|path| {
                let score = score_path(&keywords, path);
                (score > 0.0).then(|| {
                    let mut candidate = DocumentCandidate::new(path.clone());
                    candidate.score = Some(score);
                    candidate
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            let a = a.score.unwrap_or_default();
            let b = b.score.unwrap_or_default();
            b.total_cmp(&a)
        });
        tracing::debug!(matches = ranked.len(), ?keywords, "Lexical ranking complete");
        ranked
    }
}

fn score_path(keywords: &[String], path: &str) -> f32 {
    let path = path.to_lowercase();
    keywords
        .iter()
        .map(|keyword| {
            let mut count = path.matches(keyword.as_str()).count();
            if count == 0 {
                if let Some(singular) = singular(keyword) {
                    count = path.matches(singular).count();
                }
            }
            match count {
                0 => 0.0,
                n => MATCH_POINTS + REPEAT_POINTS * (n - 1) as f32,
            }
        })
        .sum()
}

fn singular(word: &str) -> Option<&str> {
    if word.chars().count() > 3 {
        word.strip_suffix('s')
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ranked_paths(query: &str, paths: &[&str]) -> Vec<(String, f32)> {
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        LexicalRanker::new()
            .rank(query, &paths)
            .into_iter()
            .map(|c| (c.path, c.score.unwrap_or_default()))
            .collect()
    }

    #[test]
    fn keywords_skip_short_words_and_duplicates() {
        assert_eq!(
            keywords("What is in my Garden garden plan?"),
            vec!["what".to_string(), "garden".to_string(), "plan".to_string()]
        );
    }

    #[test]
    fn plural_keyword_matches_singular_path() {
        assert_eq!(
            ranked_paths("list my todos", &["random.md", "todo.md"]),
            vec![("todo.md".to_string(), 10.0)]
        );
    }

    #[test]
    fn repeated_occurrences_add_points() {
        assert_eq!(
            ranked_paths("garden", &["garden.md", "garden/garden-log.md"]),
            vec![
                ("garden/garden-log.md".to_string(), 12.0),
                ("garden.md".to_string(), 10.0),
            ]
        );
    }

    #[test]
    fn distinct_keywords_each_score() {
        assert_eq!(
            ranked_paths("garden plan", &["garden.md", "garden-plan.md"]),
            vec![
                ("garden-plan.md".to_string(), 20.0),
                ("garden.md".to_string(), 10.0),
            ]
        );
    }

    #[test]
    fn ties_keep_enumeration_order() {
        assert_eq!(
            ranked_paths("notes", &["b-notes.md", "a-notes.md"]),
            vec![("b-notes.md".to_string(), 10.0), ("a-notes.md".to_string(), 10.0)]
        );
    }

    #[test]
    fn no_keywords_no_results() {
        assert!(ranked_paths("hi", &["hi.md"]).is_empty());
    }
}
