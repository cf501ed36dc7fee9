//! On-device embedding provider.
//!
//! The model is loaded lazily on first use and memoized for the lifetime of
//! the provider. Concurrent first callers share a single in-flight load; a
//! failed load is remembered and every later call yields an empty embedding.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, OnceCell};

use super::{Embedding, EmbeddingProvider, ModelLoadState, ModelType};

/// A loaded model that turns text into a pooled, normalized vector.
///
/// Encoding is CPU/GPU bound and runs on the blocking pool.
pub trait SentenceEncoder: Send + Sync {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Loads a [`SentenceEncoder`], reporting progress as it goes.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, progress: ProgressReporter) -> anyhow::Result<Arc<dyn SentenceEncoder>>;
}

/// Publishes load progress. Progress only ever moves forward.
#[derive(Clone)]
pub struct ProgressReporter {
    state: Arc<watch::Sender<ModelLoadState>>,
}

impl ProgressReporter {
    /// Reports progress as a percentage. Values at or below the current
    /// progress are ignored.
    pub fn report(&self, progress: u8) {
        let progress = progress.min(100);
        self.state.send_if_modified(|state| match state {
            ModelLoadState::Loading { progress: current } if *current < progress => {
                *current = progress;
                true
            }
            _ => false,
        });
    }
}

/// Embedding provider backed by an on-device model.
pub struct LocalEmbeddingProvider<L> {
    loader: L,
    model_type: ModelType,
    encoder: OnceCell<Result<Arc<dyn SentenceEncoder>, String>>,
    state: Arc<watch::Sender<ModelLoadState>>,
}

impl<L: ModelLoader> LocalEmbeddingProvider<L> {
    pub fn new(loader: L, model_type: ModelType) -> Self {
        let (state, _) = watch::channel(ModelLoadState::Unloaded);
        Self {
            loader,
            model_type,
            encoder: OnceCell::new(),
            state: Arc::new(state),
        }
    }

    async fn encoder(&self) -> Option<Arc<dyn SentenceEncoder>> {
        match self.encoder.get_or_init(|| self.load()).await {
            Ok(encoder) => Some(Arc::clone(encoder)),
            Err(_) => None,
        }
    }

    async fn load(&self) -> Result<Arc<dyn SentenceEncoder>, String> {
        self.state.send_replace(ModelLoadState::Loading { progress: 0 });
        tracing::info!(
            model_id = %self.model_type.hf_model_id(),
            "Loading on-device embedding model"
        );

        let reporter = ProgressReporter {
            state: Arc::clone(&self.state),
        };
        match self.loader.load(reporter).await {
            Ok(encoder) => {
                self.state.send_replace(ModelLoadState::Ready);
                tracing::info!(model_id = %self.model_type.hf_model_id(), "Embedding model ready");
                Ok(encoder)
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::error!(error = %reason, "Failed to load embedding model");
                self.state.send_replace(ModelLoadState::Failed {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    async fn encode(&self, text: String) -> Embedding {
        let Some(encoder) = self.encoder().await else {
            return Embedding::empty();
        };

        match tokio::task::spawn_blocking(move || encoder.encode(&text)).await {
            Ok(Ok(values)) => Embedding::new(values),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Local embedding failed");
                Embedding::empty()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Embedding task failed");
                Embedding::empty()
            }
        }
    }
}

#[async_trait]
impl<L: ModelLoader> EmbeddingProvider for LocalEmbeddingProvider<L> {
    fn name(&self) -> &str {
        "local"
    }

    async fn embed(&self, text: &str) -> Embedding {
        let text = match self.model_type.document_prefix() {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };
        self.encode(text).await
    }

    async fn embed_query(&self, text: &str) -> Embedding {
        let text = match self.model_type.query_prefix() {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };
        self.encode(text).await
    }

    fn load_state(&self) -> ModelLoadState {
        self.state.borrow().clone()
    }

    fn subscribe_load_state(&self) -> Option<watch::Receiver<ModelLoadState>> {
        Some(self.state.subscribe())
    }
}
