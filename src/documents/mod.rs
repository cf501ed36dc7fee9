//! Document tree access.
//!
//! The query engine never touches the filesystem directly. It enumerates and
//! reads notes through [`DocumentTree`], so tests can substitute an in-memory
//! tree and count reads.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Errors from enumerating or reading documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Read-only view of a folder tree of text notes.
#[async_trait]
pub trait DocumentTree: Send + Sync {
    /// Lists text files under `root` as `/`-separated paths relative to it.
    async fn list_text_files(&self, root: &Path) -> Result<Vec<String>>;

    /// Reads one file by its relative path.
    async fn read_text(&self, root: &Path, path: &str) -> Result<String>;
}

/// Filesystem-backed document tree.
#[derive(Debug, Clone)]
pub struct FsDocumentTree {
    extensions: Vec<String>,
}

impl FsDocumentTree {
    pub const DEFAULT_EXTENSIONS: &'static [&'static str] = &["md", "markdown", "txt"];

    pub fn new() -> Self {
        Self::with_extensions(Self::DEFAULT_EXTENSIONS.iter().copied())
    }

    /// Restricts listing to files with one of `extensions` (case-insensitive, no dot).
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_text_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl Default for FsDocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Joins a relative note path onto `root`, rejecting anything that could escape it.
fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let rel = Path::new(path);
    if rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Some(root.join(rel))
    } else {
        None
    }
}

#[async_trait]
impl DocumentTree for FsDocumentTree {
    async fn list_text_files(&self, root: &Path) -> Result<Vec<String>> {
        let root = root.to_path_buf();
        let tree = self.clone();

        tokio::task::spawn_blocking(move || {
            if !root.is_dir() {
                return Err(DocumentError::NotFound(root.display().to_string()));
            }

            let mut paths = Vec::new();
            for entry in WalkDir::new(&root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !is_hidden(e))
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !tree.is_text_file(entry.path()) {
                    continue;
                }
                if let Some(rel) = relative_path(&root, entry.path()) {
                    paths.push(rel);
                }
            }

            paths.sort();
            tracing::debug!(root = %root.display(), count = paths.len(), "Listed documents");
            Ok(paths)
        })
        .await
        .map_err(|e| DocumentError::TaskFailed(e.to_string()))?
    }

    async fn read_text(&self, root: &Path, path: &str) -> Result<String> {
        let full = resolve(root, path).ok_or_else(|| DocumentError::NotFound(path.to_string()))?;

        tokio::fs::read_to_string(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocumentError::NotFound(path.to_string())
            } else {
                DocumentError::Io {
                    path: path.to_string(),
                    source: e,
                }
            }
        })
    }
}
