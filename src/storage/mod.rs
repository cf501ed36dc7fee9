//! Credential storage.
//!
//! OS keychain integration for the remote provider's API key. Keychain calls
//! block, so they run on `tokio::task::spawn_blocking`.

mod keychain;

pub use keychain::{
    CredentialSource, KeychainAccess, KeychainCredentials, KeychainError, StaticCredential,
};
