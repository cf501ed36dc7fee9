//! Answer synthesis and citation extraction.
//!
//! Two strategies turn assembled context into an answer:
//!
//! - [`RemoteSynthesizer`] makes one completion call and asks the model to
//!   cite with `[File: path]` markers.
//! - [`LocalSynthesizer`] classifies the question and restructures note text
//!   without a generative model.

mod citations;
mod intent;
mod local;
mod phrases;
mod remote;

pub use citations::extract_citations;
pub use intent::{classify, Intent, IntentRule, INTENT_RULES};
pub use local::{greeting_message, is_greeting, LocalSynthesizer};
pub use phrases::{FixedPhrases, NoPhrases, PhraseSource, RandomPhrases};
pub use remote::RemoteSynthesizer;
