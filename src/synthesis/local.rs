//! Heuristic answer synthesis without a generative model.
//!
//! The local strategy classifies the question, pulls matching lines out of
//! the retrieved notes, and labels each excerpt with its `[File: path]`
//! marker. Every answer built from context ends with a `Sources:` footer.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::intent::{classify, Intent};
use super::phrases::{PhraseSource, RandomPhrases};
use crate::domain::{Query, NOTHING_RELEVANT};
use crate::retrieval::{keywords, ContextBlock};

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "howdy",
    "yo",
    "sup",
    "greetings",
    "hi there",
    "hey there",
    "hello there",
    "good morning",
    "good afternoon",
    "good evening",
];

const SUMMARY_FILES: usize = 2;
const SUMMARY_LINES_PER_SECTION: usize = 8;
const LIST_ITEMS_PER_SOURCE: usize = 10;
const KEY_POINTS_PER_SOURCE: usize = 8;
const KEY_POINT_MAX_CHARS: usize = 100;
const RAW_FALLBACK_LINES: usize = 5;
const GENERAL_LINES_PER_SOURCE: usize = 10;
const MAX_SOURCES: usize = 5;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s+\S").unwrap());

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s+\S").unwrap());

/// True when the whole query is a greeting like "hey" or "Hello!".
pub fn is_greeting(query: &str) -> bool {
    let normalized = query
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

/// Welcome message naming how many notes are searchable.
pub fn greeting_message(document_count: usize) -> String {
    match document_count {
        0 => "Hi! You don't have any notes yet. Add a few and I can answer questions about them."
            .to_string(),
        1 => "Hi! I can answer questions about your 1 note. Try asking me to summarize it."
            .to_string(),
        n => format!(
            "Hi! I can answer questions about your {n} notes. Try asking me to summarize a topic or list your todos."
        ),
    }
}

fn is_header(line: &str) -> bool {
    let line = line.trim();
    if HEADING_RE.is_match(line) {
        return true;
    }
    line.len() > 1
        && line.ends_with(':')
        && line.chars().count() <= 60
        && line.chars().next().is_some_and(char::is_uppercase)
}

fn is_list_item(line: &str) -> bool {
    LIST_ITEM_RE.is_match(line)
}

fn non_empty_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(str::trim_end).filter(|l| !l.trim().is_empty())
}

#[derive(Debug, Default, PartialEq)]
struct Section<'a> {
    header: Option<&'a str>,
    lines: Vec<&'a str>,
}

fn sections(content: &str) -> Vec<Section<'_>> {
    let mut sections: Vec<Section<'_>> = Vec::new();
    for line in non_empty_lines(content) {
        if is_header(line) {
            sections.push(Section {
                header: Some(line.trim()),
                lines: Vec::new(),
            });
        } else {
            match sections.last_mut() {
                Some(section) => section.lines.push(line),
                None => sections.push(Section {
                    header: None,
                    lines: vec![line],
                }),
            }
        }
    }
    sections
}

/// An excerpt drawn from one note.
#[derive(Debug, Clone, PartialEq)]
struct Excerpt {
    path: String,
    body: String,
}

impl Excerpt {
    fn new(block: &ContextBlock, lines: Vec<&str>) -> Option<Self> {
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            path: block.path.clone(),
            body: defuse_markers(&lines.join("\n")),
        })
    }
}

/// Rewrites `[File:` in note text so quoted markers are not read as citations.
fn defuse_markers(text: &str) -> String {
    text.replace("[File:", "(File:")
}

fn summarize(blocks: &[ContextBlock]) -> Vec<Excerpt> {
    blocks
        .iter()
        .filter_map(|block| {
            let mut lines = Vec::new();
            for section in sections(&block.content) {
                if !lines.is_empty() {
                    lines.push("");
                }
                lines.extend(section.header);
                lines.extend(section.lines.into_iter().take(SUMMARY_LINES_PER_SECTION));
            }
            Excerpt::new(block, lines)
        })
        .take(SUMMARY_FILES)
        .collect()
}

fn enumerate(blocks: &[ContextBlock]) -> Vec<Excerpt> {
    blocks
        .iter()
        .filter_map(|block| {
            let items = block
                .content
                .lines()
                .filter(|l| is_list_item(l))
                .map(str::trim)
                .take(LIST_ITEMS_PER_SOURCE)
                .collect();
            Excerpt::new(block, items)
        })
        .collect()
}

fn key_points(blocks: &[ContextBlock]) -> Vec<Excerpt> {
    blocks
        .iter()
        .filter_map(|block| {
            let points: Vec<&str> = non_empty_lines(&block.content)
                .filter(|l| {
                    is_header(l) || is_list_item(l) || l.chars().count() < KEY_POINT_MAX_CHARS
                })
                .map(str::trim)
                .take(KEY_POINTS_PER_SOURCE)
                .collect();
            let points = if points.is_empty() {
                non_empty_lines(&block.content)
                    .take(RAW_FALLBACK_LINES)
                    .collect()
            } else {
                points
            };
            Excerpt::new(block, points)
        })
        .collect()
}

fn general(query: &str, blocks: &[ContextBlock]) -> Vec<Excerpt> {
    if let [block] = blocks {
        let content = block.content.trim();
        return Excerpt::new(block, if content.is_empty() { vec![] } else { vec![content] })
            .into_iter()
            .collect();
    }

    let words: Vec<String> = keywords(query)
        .into_iter()
        .filter(|w| w.chars().count() > 3)
        .collect();

    let mut scored: Vec<(usize, &ContextBlock)> = blocks
        .iter()
        .map(|block| {
            let content = block.content.to_lowercase();
            let overlap = words.iter().filter(|w| content.contains(w.as_str())).count();
            (overlap, block)
        })
        .filter(|(overlap, _)| *overlap > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .filter_map(|(_, block)| {
            let lines = non_empty_lines(&block.content)
                .take(GENERAL_LINES_PER_SOURCE)
                .collect();
            Excerpt::new(block, lines)
        })
        .collect()
}

fn extract(intent: Intent, query: &str, blocks: &[ContextBlock]) -> Vec<Excerpt> {
    match intent {
        Intent::Summarize => summarize(blocks),
        Intent::Enumerate => enumerate(blocks),
        Intent::Contains => key_points(blocks),
        Intent::General => general(query, blocks),
    }
}

fn intro(intent: Intent) -> &'static str {
    match intent {
        Intent::Summarize => "Here's an overview from your notes:",
        Intent::Enumerate => "Here's what's listed in your notes:",
        Intent::Contains => "Here are the key points in your notes:",
        Intent::General => "Here's what your notes say:",
    }
}

/// Builds answers by restructuring retrieved note text.
#[derive(Clone)]
pub struct LocalSynthesizer {
    phrases: Arc<dyn PhraseSource>,
}

impl LocalSynthesizer {
    pub fn new(phrases: Arc<dyn PhraseSource>) -> Self {
        Self { phrases }
    }

    /// Answers `query` from `blocks`.
    ///
    /// Returns [`NOTHING_RELEVANT`] when no excerpt could be drawn from the
    /// context, rather than echoing unrelated notes.
    pub fn synthesize(&self, query: &Query, blocks: &[ContextBlock]) -> String {
        if blocks.is_empty() {
            return NOTHING_RELEVANT.to_string();
        }

        let intent = classify(&query.text);
        let mut used = intent;
        let mut excerpts = extract(intent, &query.text, blocks);
        if excerpts.is_empty() && intent != Intent::General {
            tracing::debug!(%intent, "No excerpts for intent, trying general");
            used = Intent::General;
            excerpts = general(&query.text, blocks);
        }
        if excerpts.is_empty() {
            return NOTHING_RELEVANT.to_string();
        }
        tracing::debug!(intent = %used, excerpts = excerpts.len(), "Local synthesis");

        let mut answer = String::new();
        if let Some(opener) = self.phrases.opener(!query.history.is_empty()) {
            answer.push_str(&opener);
            answer.push(' ');
        }
        answer.push_str(intro(used));

        for excerpt in &excerpts {
            answer.push_str(&format!("\n\n[File: {}]\n{}", excerpt.path, excerpt.body));
        }

        let mut sources: Vec<&str> = Vec::new();
        for excerpt in &excerpts {
            if !sources.contains(&excerpt.path.as_str()) {
                sources.push(&excerpt.path);
            }
        }
        answer.push_str("\n\nSources:");
        for path in sources.into_iter().take(MAX_SOURCES) {
            answer.push_str(&format!("\n- [File: {path}]"));
        }
        answer
    }
}

impl Default for LocalSynthesizer {
    fn default() -> Self {
        Self::new(Arc::new(RandomPhrases::new()))
    }
}

impl std::fmt::Debug for LocalSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSynthesizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Turn;
    use crate::synthesis::extract_citations;
    use crate::synthesis::phrases::{FixedPhrases, NoPhrases};
    use pretty_assertions::assert_eq;

    fn synth() -> LocalSynthesizer {
        LocalSynthesizer::new(Arc::new(NoPhrases))
    }

    fn todo_block() -> ContextBlock {
        ContextBlock::new(
            "todo.md",
            "# Todo\n\n- buy milk\n- call the plumber\n* [ ] renew passport\n1. file taxes\n",
        )
    }

    fn random_block() -> ContextBlock {
        ContextBlock::new(
            "random.md",
            "The weather was nice today. I walked along the river.",
        )
    }

    #[test]
    fn greetings_are_recognized() {
        for q in ["hey", "Hello!", "  hi  ", "good morning.", "Hey there"] {
            assert!(is_greeting(q), "{q}");
        }
        for q in ["hey, list my todos", "hello world", "history"] {
            assert!(!is_greeting(q), "{q}");
        }
    }

    #[test]
    fn greeting_mentions_count() {
        assert!(greeting_message(3).contains("3 notes"));
        assert!(greeting_message(1).contains("1 note"));
        assert!(greeting_message(0).contains("don't have any notes"));
    }

    #[test]
    fn headers_and_list_items() {
        assert!(is_header("## Goals"));
        assert!(is_header("Next steps:"));
        assert!(!is_header("lowercase:"));
        assert!(!is_header("#hashtag"));
        assert!(is_list_item("  - nested"));
        assert!(is_list_item("12) twelfth"));
        assert!(is_list_item("• bullet"));
        assert!(!is_list_item("-dash"));
    }

    #[test]
    fn splits_sections() {
        let parsed = sections("intro line\n# One\na\nb\nTwo:\nc");
        assert_eq!(
            parsed,
            vec![
                Section { header: None, lines: vec!["intro line"] },
                Section { header: Some("# One"), lines: vec!["a", "b"] },
                Section { header: Some("Two:"), lines: vec!["c"] },
            ]
        );
    }

    #[test]
    fn enumerate_collects_list_lines_with_sources() {
        let query = Query::new("list my todos");
        let answer = synth().synthesize(&query, &[todo_block(), random_block()]);
        assert_eq!(
            answer,
            "Here's what's listed in your notes:\n\n\
             [File: todo.md]\n- buy milk\n- call the plumber\n* [ ] renew passport\n1. file taxes\n\n\
             Sources:\n- [File: todo.md]"
        );
    }

    #[test]
    fn markers_inside_notes_are_not_cited() {
        let block = ContextBlock::new("todo.md", "- see [File: taxes/2023.md]\n- buy milk");
        let answer = synth().synthesize(&Query::new("list my todos"), &[block]);

        assert_eq!(extract_citations(&answer), vec!["todo.md"]);
        assert!(answer.contains("- see (File: taxes/2023.md]"));
        assert!(answer.contains("- buy milk"));
    }

    #[test]
    fn enumerate_caps_items_per_source() {
        let content: String = (1..=15).map(|i| format!("- item {i}\n")).collect();
        let answer = synth().synthesize(
            &Query::new("list items"),
            &[ContextBlock::new("many.md", content)],
        );
        assert!(answer.contains("- item 10"));
        assert!(!answer.contains("- item 11"));
    }

    #[test]
    fn summarize_limits_files_and_section_lines() {
        let long: String = (1..=12).map(|i| format!("line {i}\n")).collect();
        let blocks = vec![
            ContextBlock::new("a.md", format!("# Alpha\n{long}")),
            ContextBlock::new("b.md", "## Beta\nbeta body"),
            ContextBlock::new("c.md", "## Gamma\ngamma body"),
        ];
        let answer = synth().synthesize(&Query::new("summarize my notes"), &blocks);

        assert!(answer.starts_with("Here's an overview from your notes:"));
        assert!(answer.contains("[File: a.md]\n# Alpha\nline 1"));
        assert!(answer.contains("line 8"));
        assert!(!answer.contains("line 9"));
        assert!(answer.contains("[File: b.md]\n## Beta\nbeta body"));
        assert!(!answer.contains("c.md"));
    }

    #[test]
    fn contains_collects_key_points() {
        let long = "x".repeat(150);
        let block = ContextBlock::new("inbox.md", format!("Inbox:\n{long}\n- reply to Sam\nshort note"));
        let answer = synth().synthesize(&Query::new("what is in my inbox"), &[block]);
        assert!(answer.contains("[File: inbox.md]\nInbox:\n- reply to Sam\nshort note"));
        assert!(!answer.contains(&long));
    }

    #[test]
    fn contains_falls_back_to_raw_lines() {
        let lines: Vec<String> = (0..7).map(|i| format!("{i}{}", "y".repeat(120))).collect();
        let block = ContextBlock::new("wall.md", lines.join("\n"));
        let answer = synth().synthesize(&Query::new("what's in wall"), &[block]);
        assert!(answer.contains(&lines[4]));
        assert!(!answer.contains(&lines[5]));
    }

    #[test]
    fn general_uses_word_overlap() {
        let blocks = vec![
            ContextBlock::new("garden.md", "Planted tomatoes in May.\nWatered daily."),
            ContextBlock::new("work.md", "Quarterly report due."),
        ];
        let answer = synth().synthesize(&Query::new("when did I plant tomatoes"), &blocks);
        assert!(answer.contains("[File: garden.md]\nPlanted tomatoes in May.\nWatered daily."));
        assert!(!answer.contains("work.md"));
    }

    #[test]
    fn general_single_block_is_verbatim() {
        let block = ContextBlock::new("only.md", "Unrelated words entirely.");
        let answer = synth().synthesize(&Query::new("zebra"), &[block]);
        assert!(answer.contains("[File: only.md]\nUnrelated words entirely."));
    }

    #[test]
    fn empty_strategy_falls_back_to_general() {
        let blocks = vec![ContextBlock::new("plain.md", "Tomatoes grow best in sun.")];
        let answer = synth().synthesize(&Query::new("list tomatoes"), &blocks);
        assert!(answer.starts_with("Here's what your notes say:"));
        assert!(answer.contains("[File: plain.md]"));
    }

    #[test]
    fn no_overlap_is_nothing_relevant() {
        let blocks = vec![
            ContextBlock::new("a.md", "apples"),
            ContextBlock::new("b.md", "bananas"),
        ];
        let answer = synth().synthesize(&Query::new("quarterly taxes"), &blocks);
        assert_eq!(answer, NOTHING_RELEVANT);
    }

    #[test]
    fn no_context_is_nothing_relevant() {
        assert_eq!(synth().synthesize(&Query::new("anything"), &[]), NOTHING_RELEVANT);
    }

    #[test]
    fn sources_footer_caps_at_five() {
        let blocks: Vec<ContextBlock> = (0..7)
            .map(|i| ContextBlock::new(format!("n{i}.md"), "- item"))
            .collect();
        let answer = synth().synthesize(&Query::new("list items"), &blocks);
        let footer = answer.split("Sources:").nth(1).unwrap();
        assert_eq!(footer.matches("[File:").count(), 5);
    }

    #[test]
    fn opener_is_prefixed() {
        let synth = LocalSynthesizer::new(Arc::new(FixedPhrases("Sure!".to_string())));
        let answer = synth.synthesize(&Query::new("list my todos"), &[todo_block()]);
        assert!(answer.starts_with("Sure! Here's what's listed"));
    }

    #[test]
    fn follow_up_gets_connector() {
        struct Marked;
        impl PhraseSource for Marked {
            fn opener(&self, follow_up: bool) -> Option<String> {
                Some(if follow_up { "Then:" } else { "First:" }.to_string())
            }
        }

        let synth = LocalSynthesizer::new(Arc::new(Marked));
        let query = Query::new("list my todos").with_history(vec![
            Turn::user("summarize my week"),
            Turn::assistant("You were busy."),
        ]);
        assert!(synth.synthesize(&query, &[todo_block()]).starts_with("Then:"));
    }
}
