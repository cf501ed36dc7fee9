//! Embedding provider trait.

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Embedding, ModelLoadState};

/// Converts text to a fixed-length vector.
///
/// Implementations never fail: any transport, model, or inference error is
/// logged and reported as [`Embedding::empty`], which callers treat as "no
/// signal" rather than as zero similarity.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the provider's name (e.g., "local", "openai-compatible").
    fn name(&self) -> &str;

    /// Embeds a document fingerprint.
    async fn embed(&self, text: &str) -> Embedding;

    /// Embeds a search query. Models with asymmetric prefixes override this.
    async fn embed_query(&self, text: &str) -> Embedding {
        self.embed(text).await
    }

    /// Current model load state. Remote providers are always ready.
    fn load_state(&self) -> ModelLoadState {
        ModelLoadState::Ready
    }

    /// Subscribes to load state changes, for providers that load lazily.
    fn subscribe_load_state(&self) -> Option<watch::Receiver<ModelLoadState>> {
        None
    }
}
