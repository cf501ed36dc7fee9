//! Keychain access for secure credential storage.
//!
//! Wraps the keyring crate to provide OS-native credential storage.
//! The remote provider's API key lives here and is read at query time,
//! never cached in settings.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Provides access to the OS keychain for credential storage.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service_name: String,
}

impl KeychainAccess {
    /// Default service name for marginalia credentials.
    pub const DEFAULT_SERVICE: &'static str = "io.marginalia.app";

    pub fn new() -> Self {
        Self {
            service_name: Self::DEFAULT_SERVICE.to_string(),
        }
    }

    /// Creates a new KeychainAccess with a custom service name.
    ///
    /// Useful for testing to avoid interfering with real credentials.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Stores a credential, overwriting any existing value for the key.
    pub async fn store(&self, key: &str, value: &str) -> Result<()> {
        let service = self.service_name.clone();
        let key = key.to_string();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            entry.set_password(&value)?;
            Ok(())
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Retrieves a credential. Returns `None` if no credential exists for the key.
    pub async fn retrieve(&self, key: &str) -> Result<Option<String>> {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            match entry.get_password() {
                Ok(password) => Ok(Some(password)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(KeychainError::Keyring(e)),
            }
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Deletes a credential. Errors if it does not exist.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            match entry.delete_credential() {
                Ok(()) => Ok(()),
                Err(keyring::Error::NoEntry) => Err(KeychainError::NotFound(key)),
                Err(e) => Err(KeychainError::Keyring(e)),
            }
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Generates a keychain key for an AI provider's API key.
    pub fn ai_api_key(provider: &str) -> String {
        format!("ai.api_key.{}", provider)
    }
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of the remote provider credential.
///
/// Looked up on every remote query so a key stored mid-session takes effect
/// without a restart.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Returns the credential, or `None` when none is configured.
    async fn get_credential(&self) -> Option<String>;
}

/// Reads the API key for one provider from the OS keychain.
#[derive(Debug, Clone)]
pub struct KeychainCredentials {
    keychain: KeychainAccess,
    provider: String,
}

impl KeychainCredentials {
    pub fn new(keychain: KeychainAccess, provider: impl Into<String>) -> Self {
        Self {
            keychain,
            provider: provider.into(),
        }
    }

    pub fn key(&self) -> String {
        KeychainAccess::ai_api_key(&self.provider)
    }
}

#[async_trait]
impl CredentialSource for KeychainCredentials {
    async fn get_credential(&self) -> Option<String> {
        match self.keychain.retrieve(&self.key()).await {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(provider = %self.provider, error = %e, "Keychain lookup failed");
                None
            }
        }
    }
}

/// A fixed credential, typically from the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(value: Option<String>) -> Self {
        Self(value.filter(|v| !v.trim().is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn get_credential(&self) -> Option<String> {
        self.0.clone()
    }
}
