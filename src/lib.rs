//! roomservice - device tree retrieval for repo checkouts
//!
//! Finds the device tree for a lunch product on GitHub, records it in
//! `.repo/local_manifests/roomservice.xml`, syncs it with repo and expands
//! the `lineage.dependencies` files it and its dependencies declare.
//!
//! # Architecture
//!
//! - **target**: product → device codename, device tree naming
//! - **integrations**: GitHub search, branch and tag listing
//! - **manifest**: XML manifest parsing, writing and the three-manifest store
//! - **revision**: default/tag/fallback revision selection
//! - **dependencies**: recursive `lineage.dependencies` expansion
//! - **sync**: `repo sync` trigger
//! - **roomservice**: the end-to-end workflow

// Core modules
pub mod config;
pub mod error;
pub mod logging;

// Workflow
pub mod dependencies;
pub mod integrations;
pub mod manifest;
pub mod revision;
pub mod roomservice;
pub mod sync;
pub mod target;

// Re-exports
pub use error::{Result, RoomserviceError};
pub use roomservice::{Outcome, Roomservice};
