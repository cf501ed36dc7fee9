//! Services layer.
//!
//! Services sit between callers (the CLI, or a UI) and the infrastructure
//! they coordinate:
//!
//! ```text
//!   Callers (CLI, UI)
//!          |
//!          v
//!    QueryService
//!          |
//!          v
//! Documents, Embedding, Retrieval, Synthesis, Providers, Storage
//! ```

mod query_service;

pub use query_service::{
    EngineComponents, OpenAiBackend, QueryError, QueryResult, QueryService, RemoteBackend,
};
