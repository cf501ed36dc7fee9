//! Conversational opener phrases for local answers.

use rand::seq::SliceRandom;

const OPENERS: &[&str] = &[
    "Sure!",
    "Here you go.",
    "Good question.",
    "Let me check your notes.",
    "Happy to help.",
];

const CONNECTORS: &[&str] = &[
    "Following up on that:",
    "Building on what we discussed:",
    "Picking up from there:",
    "On that note:",
];

/// Supplies the optional phrase that opens a local answer.
pub trait PhraseSource: Send + Sync {
    /// Returns an opener, or `None` for no opener. `follow_up` is set when
    /// the query continues an earlier conversation.
    fn opener(&self, follow_up: bool) -> Option<String>;
}

/// Picks openers at random from a fixed bank.
#[derive(Debug, Clone)]
pub struct RandomPhrases {
    openers: Vec<String>,
    connectors: Vec<String>,
}

impl RandomPhrases {
    pub fn new() -> Self {
        Self::with_banks(OPENERS, CONNECTORS)
    }

    pub fn with_banks(openers: &[&str], connectors: &[&str]) -> Self {
        Self {
            openers: openers.iter().map(|s| s.to_string()).collect(),
            connectors: connectors.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for RandomPhrases {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseSource for RandomPhrases {
    fn opener(&self, follow_up: bool) -> Option<String> {
        let bank = if follow_up && !self.connectors.is_empty() {
            &self.connectors
        } else {
            &self.openers
        };
        bank.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Never adds an opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPhrases;

impl PhraseSource for NoPhrases {
    fn opener(&self, _follow_up: bool) -> Option<String> {
        None
    }
}

/// Always uses the same opener.
#[derive(Debug, Clone)]
pub struct FixedPhrases(pub String);

impl PhraseSource for FixedPhrases {
    fn opener(&self, _follow_up: bool) -> Option<String> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_opener_comes_from_bank() {
        let phrases = RandomPhrases::new();
        for _ in 0..20 {
            let opener = phrases.opener(false).unwrap();
            assert!(OPENERS.contains(&opener.as_str()), "{opener}");
        }
    }

    #[test]
    fn follow_up_uses_connectors() {
        let phrases = RandomPhrases::new();
        let opener = phrases.opener(true).unwrap();
        assert!(CONNECTORS.contains(&opener.as_str()), "{opener}");
    }

    #[test]
    fn empty_bank_gives_no_opener() {
        let phrases = RandomPhrases::with_banks(&[], &[]);
        assert_eq!(phrases.opener(false), None);
        assert_eq!(phrases.opener(true), None);
    }

    #[test]
    fn deterministic_sources() {
        assert_eq!(NoPhrases.opener(true), None);
        assert_eq!(
            FixedPhrases("Okay.".to_string()).opener(false),
            Some("Okay.".to_string())
        );
    }
}
