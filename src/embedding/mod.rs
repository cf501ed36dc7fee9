//! Vector embeddings for semantic ranking.
//!
//! Two interchangeable providers implement [`EmbeddingProvider`]:
//!
//! - [`LocalEmbeddingProvider`] runs a small sentence-transformer on-device
//!   with Candle, loading it lazily on first use
//! - [`RemoteEmbeddingProvider`] calls an OpenAI-compatible embeddings API
//!
//! Neither provider returns errors. Failures surface as an empty
//! [`Embedding`], which the ranker treats as "no signal".

mod candle;
mod engine;
mod local;
mod models;
mod provider;
mod remote;

pub use candle::{masked_mean_l2, CandleEncoder, CandleModelLoader, EmbeddingConfig};
pub use engine::Embedding;
pub use local::{LocalEmbeddingProvider, ModelLoader, ProgressReporter, SentenceEncoder};
pub use models::{ModelLoadState, ModelType};
pub use provider::EmbeddingProvider;
pub use remote::RemoteEmbeddingProvider;
