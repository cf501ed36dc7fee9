//! Application settings and configuration types.
//!
//! Settings are persisted as JSON in the user's config directory
//! (`~/.config/marginalia/settings.json` or the platform equivalent).
//! Every section has defaults, so partial files load cleanly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::{EmbeddingConfig, ModelType};
use crate::providers::ai::OPENAI_BASE_URL;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid remote base URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("unknown provider mode: {0}")]
    UnknownMode(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Which backend answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Call a remote model provider. Requires a credential.
    Remote,
    /// On-device embeddings and heuristic synthesis. Nothing leaves the machine.
    #[default]
    Local,
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for ProviderMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(SettingsError::UnknownMode(other.to_string())),
        }
    }
}

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Active backend.
    pub mode: ProviderMode,
    /// Candidate sampling and ranking parameters.
    pub retrieval: RetrievalSettings,
    /// Remote provider configuration.
    pub remote: RemoteSettings,
    /// On-device model configuration.
    pub local: LocalModelSettings,
}

impl Settings {
    /// Default settings file location for this platform.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "marginalia", "marginalia")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes settings to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.remote.validate()
    }
}

/// Retrieval parameters.
///
/// The defaults bound per-query latency; they are tunable, not load-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Maximum candidates embedded per query. Later documents are never scanned.
    pub max_candidates: usize,
    /// Characters of content included in each candidate fingerprint.
    pub fingerprint_chars: usize,
    /// Candidates must score strictly above this cosine similarity.
    pub similarity_threshold: f32,
    /// Per-document character limit for remote synthesis context.
    pub remote_document_chars: usize,
    /// Recent user turns appended to the query for retrieval.
    pub history_turns: usize,
    /// File extensions treated as notes.
    pub note_extensions: Vec<String>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            max_candidates: 30,
            fingerprint_chars: 1000,
            similarity_threshold: 0.3,
            remote_document_chars: 4000,
            history_turns: 2,
            note_extensions: vec!["md".to_string()],
        }
    }
}

/// Remote provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Provider name, used as the keychain identifier for the API key.
    pub provider: String,
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Model used for answer synthesis.
    pub completion_model: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Sampling temperature for synthesis.
    pub temperature: f32,
    /// Maximum tokens in a synthesized answer.
    pub max_tokens: Option<usize>,
    /// HTTP timeout for provider calls.
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            completion_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.2,
            max_tokens: Some(1024),
            timeout_secs: 60,
        }
    }
}

impl RemoteSettings {
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|source| SettingsError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(())
    }
}

/// On-device model configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelSettings {
    /// Which embedding model to run.
    pub model: ModelType,
    /// Directory holding pre-downloaded model files.
    pub model_path: Option<PathBuf>,
    /// Whether to use GPU acceleration if available.
    pub use_gpu: bool,
}

impl LocalModelSettings {
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model_path: self.model_path.clone(),
            model_type: self.model,
            use_gpu: self.use_gpu,
        }
    }
}
