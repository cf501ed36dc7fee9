//! Query orchestration.
//!
//! [`QueryService`] is the engine's public entry point. It checks the mode
//! precondition, enumerates notes, ranks them, assembles context, and hands
//! it to the synthesizer for the active mode.

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::config::{ProviderMode, RemoteSettings, RetrievalSettings, Settings};
use crate::documents::{DocumentError, DocumentTree, FsDocumentTree};
use crate::domain::{AnswerResult, Query, NOTHING_RELEVANT};
use crate::embedding::{
    CandleModelLoader, EmbeddingProvider, LocalEmbeddingProvider, ModelLoadState,
    RemoteEmbeddingProvider,
};
use crate::providers::ai::{LlmError, LlmProvider, OpenAiCompatibleProvider};
use crate::retrieval::{ContextAssembler, LexicalRanker, SemanticRanker};
use crate::storage::{CredentialSource, KeychainAccess, KeychainCredentials};
use crate::synthesis::{
    extract_citations, greeting_message, is_greeting, LocalSynthesizer, PhraseSource,
    RandomPhrases, RemoteSynthesizer,
};

/// Errors surfaced by a query.
///
/// Having nothing relevant to say is not an error; see
/// [`AnswerResult::nothing_relevant`].
#[derive(Debug, Error)]
pub enum QueryError {
    /// The active mode cannot run as configured. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote completion call failed.
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),

    /// The document tree could not be enumerated.
    #[error("document error: {0}")]
    Documents(#[from] DocumentError),
}

/// Result type for query operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Builds remote providers for a credential.
///
/// Providers are built per query so a key stored mid-session is picked up.
pub trait RemoteBackend: Send + Sync {
    fn embedder(&self, api_key: &str) -> Arc<dyn EmbeddingProvider>;
    fn completer(&self, api_key: &str) -> Arc<dyn LlmProvider>;
}

/// Remote backend for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    settings: RemoteSettings,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(settings: RemoteSettings) -> QueryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(LlmError::from)?;
        Ok(Self { settings, client })
    }
}

impl RemoteBackend for OpenAiBackend {
    fn embedder(&self, api_key: &str) -> Arc<dyn EmbeddingProvider> {
        Arc::new(
            RemoteEmbeddingProvider::new(
                &self.settings.base_url,
                api_key,
                &self.settings.embedding_model,
            )
            .with_client(self.client.clone()),
        )
    }

    fn completer(&self, api_key: &str) -> Arc<dyn LlmProvider> {
        Arc::new(
            OpenAiCompatibleProvider::new(
                &self.settings.base_url,
                api_key,
                &self.settings.completion_model,
            )
            .with_client(self.client.clone()),
        )
    }
}

/// Collaborators the engine runs against.
#[derive(Clone)]
pub struct EngineComponents {
    pub documents: Arc<dyn DocumentTree>,
    pub credentials: Arc<dyn CredentialSource>,
    pub local_embedder: Arc<dyn EmbeddingProvider>,
    pub remote: Arc<dyn RemoteBackend>,
    pub phrases: Arc<dyn PhraseSource>,
}

impl EngineComponents {
    /// Production collaborators: filesystem notes, OS keychain, candle
    /// embeddings, and an OpenAI-compatible remote.
    pub fn from_settings(settings: &Settings) -> QueryResult<Self> {
        let local = &settings.local;
        Ok(Self {
            documents: Arc::new(FsDocumentTree::with_extensions(
                &settings.retrieval.note_extensions,
            )),
            credentials: Arc::new(KeychainCredentials::new(
                KeychainAccess::new(),
                &settings.remote.provider,
            )),
            local_embedder: Arc::new(LocalEmbeddingProvider::new(
                CandleModelLoader::new(local.embedding_config()),
                local.model,
            )),
            remote: Arc::new(OpenAiBackend::new(settings.remote.clone())?),
            phrases: Arc::new(RandomPhrases::new()),
        })
    }
}

/// Remote providers resolved for one query.
struct RemoteSession {
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn LlmProvider>,
}

/// Answers questions over a folder of notes.
///
/// Shareable across tasks; the only mutable state is the provider mode and
/// the local model's load state.
pub struct QueryService {
    components: EngineComponents,
    retrieval: RetrievalSettings,
    remote: RemoteSettings,
    mode: RwLock<ProviderMode>,
    local: LocalSynthesizer,
}

impl QueryService {
    pub fn new(components: EngineComponents, settings: &Settings) -> Self {
        let local = LocalSynthesizer::new(Arc::clone(&components.phrases));
        Self {
            components,
            retrieval: settings.retrieval.clone(),
            remote: settings.remote.clone(),
            mode: RwLock::new(settings.mode),
            local,
        }
    }

    /// Builds a service with the production collaborators.
    pub fn from_settings(settings: &Settings) -> QueryResult<Self> {
        Ok(Self::new(EngineComponents::from_settings(settings)?, settings))
    }

    pub fn mode(&self) -> ProviderMode {
        match self.mode.read() {
            Ok(mode) => *mode,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set_mode(&self, mode: ProviderMode) {
        let mut guard = match self.mode.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = *guard;
        if previous != mode {
            tracing::info!(from = %previous, to = %mode, "Switching provider mode");
            *guard = mode;
        }
    }

    /// Whether the on-device model is loading right now.
    pub fn is_loading(&self) -> bool {
        self.load_state().is_loading()
    }

    /// On-device model load progress, 0 to 100.
    pub fn load_progress(&self) -> u8 {
        self.load_state().progress()
    }

    pub fn load_state(&self) -> ModelLoadState {
        self.components.local_embedder.load_state()
    }

    /// Streams on-device model load state changes.
    pub fn subscribe_load_state(&self) -> Option<watch::Receiver<ModelLoadState>> {
        self.components.local_embedder.subscribe_load_state()
    }

    /// Asks a single question with default options.
    pub async fn ask(&self, root: &Path, text: &str) -> QueryResult<AnswerResult> {
        self.query(root, &Query::new(text)).await
    }

    /// Answers `query` from the notes under `root`.
    pub async fn query(&self, root: &Path, query: &Query) -> QueryResult<AnswerResult> {
        let mode = self.mode();
        let remote = match mode {
            ProviderMode::Remote => Some(self.remote_session().await?),
            ProviderMode::Local => None,
        };

        if mode == ProviderMode::Local && is_greeting(&query.text) {
            let count = match self.list_notes(root).await {
                Ok(paths) => paths.len(),
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Could not count notes");
                    0
                }
            };
            return Ok(AnswerResult::uncited(greeting_message(count)));
        }

        let paths = self.list_notes(root).await?;
        if paths.is_empty() {
            tracing::info!(root = %root.display(), "No notes to search");
            return Ok(AnswerResult::nothing_relevant());
        }

        let embedder: &dyn EmbeddingProvider = match &remote {
            Some(session) => session.embedder.as_ref(),
            None => self.components.local_embedder.as_ref(),
        };
        let documents = self.components.documents.as_ref();
        let retrieval_text = query.retrieval_text(self.retrieval.history_turns);

        let ranked = match SemanticRanker::from_settings(&self.retrieval)
            .rank(embedder, documents, root, &retrieval_text, &paths)
            .await
        {
            Some(ranked) => ranked,
            None => {
                tracing::info!("No semantic match, falling back to lexical ranking");
                LexicalRanker::new().rank(&retrieval_text, &paths)
            }
        };
        if ranked.is_empty() {
            return Ok(AnswerResult::nothing_relevant());
        }

        let blocks = ContextAssembler::new(query.max_context_documents)
            .assemble(documents, root, ranked)
            .await;
        if blocks.is_empty() {
            return Ok(AnswerResult::nothing_relevant());
        }

        let answer = match remote {
            Some(session) => {
                RemoteSynthesizer::new(session.completer, self.retrieval.remote_document_chars)
                    .with_sampling(self.remote.temperature, self.remote.max_tokens)
                    .synthesize(query, &blocks)
                    .await?
            }
            None => self.local.synthesize(query, &blocks),
        };
        if answer == NOTHING_RELEVANT {
            return Ok(AnswerResult::nothing_relevant());
        }

        // Only documents that were in the context can back the answer.
        let citations: Vec<String> = extract_citations(&answer)
            .into_iter()
            .filter(|cited| blocks.iter().any(|block| &block.path == cited))
            .collect();
        tracing::info!(
            %mode,
            documents = blocks.len(),
            citations = citations.len(),
            "Query answered"
        );
        Ok(AnswerResult::new(answer, citations))
    }

    async fn remote_session(&self) -> QueryResult<RemoteSession> {
        let api_key = self
            .components
            .credentials
            .get_credential()
            .await
            .ok_or_else(|| {
                QueryError::Configuration(format!(
                    "remote mode needs an API key for provider '{}'",
                    self.remote.provider
                ))
            })?;

        Ok(RemoteSession {
            embedder: self.components.remote.embedder(&api_key),
            completer: self.components.remote.completer(&api_key),
        })
    }

    /// Lists notes under `root` with a note extension, sorted.
    async fn list_notes(&self, root: &Path) -> QueryResult<Vec<String>> {
        let mut paths: Vec<String> = self
            .components
            .documents
            .list_text_files(root)
            .await?
            .into_iter()
            .filter(|path| self.is_note(path))
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn is_note(&self, path: &str) -> bool {
        let Some((_, extension)) = path.rsplit_once('.') else {
            return false;
        };
        self.retrieval
            .note_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("mode", &self.mode())
            .field("retrieval", &self.retrieval)
            .finish_non_exhaustive()
    }
}
