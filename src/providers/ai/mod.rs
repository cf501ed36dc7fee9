//! Remote completion providers.
//!
//! Only used when the user opts into remote mode. Every provider implements
//! [`LlmProvider`]; the OpenAI-compatible dialect covers hosted and
//! self-hosted endpoints alike.

mod openai;
mod traits;

pub use openai::{OpenAiCompatibleProvider, OPENAI_BASE_URL};
pub use traits::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, LlmResult,
    Message, Role, TokenUsage,
};
