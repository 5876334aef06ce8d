//! External Integrations
//!
//! Adapters for the code-hosting API device trees are discovered on.
//!
//! # Built-in Integrations
//!
//! - **GitHub**: REST search plus branch/tag listing

pub mod github;

pub use github::{search_query, GitHubClient, RepositoryCandidate};
