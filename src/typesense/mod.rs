//! Typesense-backed implementation of the [`DocumentStore`](crate::domain::DocumentStore) contract.

mod client;
mod types;

pub use client::{SEARCH_TOP_K, TypesenseClient};
