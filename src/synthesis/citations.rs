//! Citation marker extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `[File: name]`, capturing the name.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[File:\s*([^\]]+)\]").unwrap());

/// Returns the distinct file names cited in `answer`, in first-seen order.
///
/// Unterminated markers and blank names are ignored. A name ends at the
/// first `]`, so paths containing `]` cannot be cited and come back cut short.
pub fn extract_citations(answer: &str) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();
    for caps in MARKER_RE.captures_iter(answer) {
        let name = caps[1].trim();
        if name.is_empty() || citations.iter().any(|c| c == name) {
            continue;
        }
        citations.push(name.to_string());
    }
    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_in_first_seen_order() {
        let answer = "See [File: b.md] and [File: a.md], also [File: b.md] again.\n\
                      Sources:\n- [File: a.md]\n- [File: c/d.md]";
        assert_eq!(extract_citations(answer), vec!["b.md", "a.md", "c/d.md"]);
    }

    #[test]
    fn name_ends_at_first_closing_bracket() {
        assert_eq!(extract_citations("[File: a]b.md]"), vec!["a"]);
    }

    #[test]
    fn no_markers_is_empty() {
        assert!(extract_citations("Nothing cited here.").is_empty());
    }

    #[test]
    fn unterminated_marker_is_ignored() {
        assert!(extract_citations("Broken [File: notes.md").is_empty());
        assert_eq!(extract_citations("[File: ok.md] then [File: broken"), vec!["ok.md"]);
    }

    #[test]
    fn blank_names_are_ignored() {
        assert!(extract_citations("[File:   ]").is_empty());
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(extract_citations("[File:  spaced.md ]"), vec!["spaced.md"]);
    }
}
