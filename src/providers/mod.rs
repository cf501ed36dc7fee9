//! External model providers.
//!
//! - [`ai`] - remote completion providers (OpenAI-compatible)

pub mod ai;
