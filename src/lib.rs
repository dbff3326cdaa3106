#![deny(missing_docs)]

//! Core library for the semsearch server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Document data model and the vector store capability contract.
pub mod domain;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Indexing and query pipelines.
pub mod pipeline;
/// Summarization client abstraction and adapters.
pub mod summarization;
/// Typesense vector store integration.
pub mod typesense;
