//! marginalia - Private, citation-grounded question answering over notes
//!
//! This crate answers free-text questions over a folder of text notes. It
//! ranks the notes most relevant to a question and produces an answer that
//! cites them with `[File: path]` markers. Two backends are supported:
//! on-device embeddings with heuristic synthesis, or an OpenAI-compatible
//! remote provider the user opts into.

pub mod config;
pub mod documents;
pub mod domain;
pub mod embedding;
pub mod providers;
pub mod retrieval;
pub mod services;
pub mod storage;
pub mod synthesis;

pub use domain::{AnswerResult, Query};
pub use services::{EngineComponents, QueryError, QueryService};
