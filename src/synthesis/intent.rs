//! Question intent classification.
//!
//! Rules are evaluated top to bottom and the first match wins. Anything that
//! matches no rule is [`Intent::General`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static SUMMARIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(summari[sz]e|summary|overview|what\s+is|what's|tell\s+me\s+about|explain|describe)\b",
    )
    .unwrap()
});

static ENUMERATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(list|what\s+are|which|show\s+me|enumerate)\b").unwrap()
});

static CONTAINS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(what\s+is\s+in|what's\s+in|what\s+does\b.*\bcontain|contents?\s+of)\b")
        .unwrap()
});

/// What kind of answer a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Summarize,
    Enumerate,
    Contains,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Enumerate => "enumerate",
            Self::Contains => "contains",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate paired with the intent it selects.
#[derive(Clone, Copy)]
pub struct IntentRule {
    pub intent: Intent,
    pub matches: fn(&str) -> bool,
}

impl fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentRule")
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

/// "what is in X" also matches the summarize pattern; leave it to the contains rule.
fn is_summarize(query: &str) -> bool {
    SUMMARIZE_RE.is_match(query) && !CONTAINS_RE.is_match(query)
}

fn is_enumerate(query: &str) -> bool {
    ENUMERATE_RE.is_match(query)
}

fn is_contains(query: &str) -> bool {
    CONTAINS_RE.is_match(query)
}

/// Classification rules in priority order.
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Summarize,
        matches: is_summarize,
    },
    IntentRule {
        intent: Intent::Enumerate,
        matches: is_enumerate,
    },
    IntentRule {
        intent: Intent::Contains,
        matches: is_contains,
    },
];

pub fn classify(query: &str) -> Intent {
    INTENT_RULES
        .iter()
        .find(|rule| (rule.matches)(query))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_ordered() {
        let order: Vec<Intent> = INTENT_RULES.iter().map(|r| r.intent).collect();
        assert_eq!(order, vec![Intent::Summarize, Intent::Enumerate, Intent::Contains]);
    }

    #[test]
    fn summarize_rule() {
        for q in [
            "Summarize my meeting notes",
            "give me an overview of the project",
            "what is the garden plan",
            "tell me about Rust",
            "Explain the budget",
        ] {
            assert_eq!(classify(q), Intent::Summarize, "{q}");
        }
    }

    #[test]
    fn enumerate_rule() {
        for q in ["list my todos", "what are my goals", "which books did I read", "show me the tasks"] {
            assert_eq!(classify(q), Intent::Enumerate, "{q}");
        }
    }

    #[test]
    fn contains_rule() {
        for q in [
            "what is in the inbox note",
            "what's in groceries.md",
            "what does the plan contain",
            "contents of journal",
        ] {
            assert_eq!(classify(q), Intent::Contains, "{q}");
        }
    }

    #[test]
    fn summarize_wins_over_enumerate() {
        assert_eq!(classify("summarize and list my todos"), Intent::Summarize);
    }

    #[test]
    fn enumerate_wins_over_contains() {
        assert_eq!(classify("list what is in my inbox"), Intent::Enumerate);
    }

    #[test]
    fn anything_else_is_general() {
        assert_eq!(classify("when did I plant tomatoes"), Intent::General);
        assert_eq!(classify(""), Intent::General);
    }

    #[test]
    fn words_match_on_boundaries() {
        assert_eq!(classify("my playlist ideas"), Intent::General);
    }
}
