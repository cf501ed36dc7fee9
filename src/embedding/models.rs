//! On-device embedding models and their load state.

use serde::{Deserialize, Serialize};

/// Embedding models that can run on-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// All-MiniLM-L6-v2 - small, fast, general purpose.
    #[default]
    AllMiniLmL6V2,
    /// BGE-Small - optimized for retrieval tasks.
    BgeSmall,
    /// E5-Small - good for asymmetric search.
    E5Small,
}

impl ModelType {
    /// Returns the Hugging Face model ID.
    pub fn hf_model_id(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::BgeSmall => "BAAI/bge-small-en-v1.5",
            Self::E5Small => "intfloat/e5-small-v2",
        }
    }

    /// Returns the expected embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        384
    }

    /// Returns the maximum sequence length in tokens.
    pub fn max_seq_length(&self) -> usize {
        match self {
            Self::AllMiniLmL6V2 => 256,
            Self::BgeSmall | Self::E5Small => 512,
        }
    }

    /// Prefix prepended to queries, if the model expects one.
    pub fn query_prefix(&self) -> Option<&'static str> {
        match self {
            Self::E5Small => Some("query: "),
            Self::BgeSmall => Some("Represent this sentence for searching relevant passages: "),
            Self::AllMiniLmL6V2 => None,
        }
    }

    /// Prefix prepended to documents, if the model expects one.
    pub fn document_prefix(&self) -> Option<&'static str> {
        match self {
            Self::E5Small => Some("passage: "),
            _ => None,
        }
    }
}

/// Lifecycle of the on-device model.
///
/// Transitions once per process: `Unloaded -> Loading -> Ready | Failed`.
/// A failed load is not retried.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelLoadState {
    #[default]
    Unloaded,
    Loading {
        /// Progress percentage (0-100).
        progress: u8,
    },
    Ready,
    Failed {
        reason: String,
    },
}

impl ModelLoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Progress as a percentage; 100 once ready.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Unloaded | Self::Failed { .. } => 0,
            Self::Loading { progress } => *progress,
            Self::Ready => 100,
        }
    }
}
