//! Configuration and settings management.
//!
//! This module provides the settings types and their JSON persistence.

mod settings;

pub use settings::{
    LocalModelSettings, ProviderMode, RemoteSettings, RetrievalSettings, Settings, SettingsError,
};
