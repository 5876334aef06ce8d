//! Dependency expansion
//!
//! A repository may ship a `lineage.dependencies` JSON file naming further
//! repositories it needs:
//!
//! ```json
//! [
//!   { "repository": "android_device_acme_widget-common", "target_path": "device/acme/widget-common" },
//!   { "repository": "android_kernel_acme_sm8250", "target_path": "kernel/acme/sm8250", "branch": "lineage-20" }
//! ]
//! ```
//!
//! Every listed repository is added to the local manifest (unless some
//! manifest already has its path), synced when new or missing on disk, and
//! then expanded in turn.

use crate::manifest::ManifestStore;
use crate::sync::SyncTrigger;
use crate::{Result, RoomserviceError};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the per-repository dependency file
pub const DEPENDENCIES_FILE: &str = "lineage.dependencies";

/// One entry of a dependency file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencyRecord {
    /// Repository name without the organization
    pub repository: String,

    /// Checkout path
    pub target_path: String,

    /// Revision to pin instead of the fallback/default
    #[serde(default)]
    pub branch: Option<String>,
}

/// Read and parse a dependency file
pub fn parse_dependencies(content: &str, source: &Path) -> Result<Vec<DependencyRecord>> {
    serde_json::from_str(content).map_err(|e| {
        RoomserviceError::Parse(format!("Invalid dependency file {}: {}", source.display(), e))
    })
}

/// Walks dependency files starting at a repository path
pub struct DependencyWalker<'a> {
    store: &'a ManifestStore,
    syncer: &'a dyn SyncTrigger,
    visited: HashSet<String>,
    ancestors: Vec<String>,
}

impl<'a> DependencyWalker<'a> {
    pub fn new(store: &'a ManifestStore, syncer: &'a dyn SyncTrigger) -> Self {
        Self {
            store,
            syncer,
            visited: HashSet::new(),
            ancestors: Vec::new(),
        }
    }

    /// Paths expanded so far in this walk
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Expand the dependencies of `repo_path`, recursively
    ///
    /// `fallback_revision` applies to entries of this file only; nested files
    /// are expanded without a fallback. A path already expanded in this walk
    /// is skipped, so cyclic dependency files terminate.
    pub fn fetch_dependencies(
        &mut self,
        repo_path: &str,
        fallback_revision: Option<&str>,
    ) -> Result<()> {
        if self.ancestors.iter().any(|p| p == repo_path) {
            warn!(
                path = %repo_path,
                chain = ?self.ancestors,
                "Dependency cycle detected, not expanding again"
            );
            return Ok(());
        }
        if !self.visited.insert(repo_path.to_string()) {
            debug!(path = %repo_path, "Already expanded");
            return Ok(());
        }

        self.ancestors.push(repo_path.to_string());
        let result = self.expand(repo_path, fallback_revision);
        self.ancestors.pop();
        result
    }

    fn expand(&mut self, repo_path: &str, fallback_revision: Option<&str>) -> Result<()> {
        println!("Looking for dependencies in {}", repo_path);
        let root = self.store.root();
        let dependencies_path = root.join(repo_path).join(DEPENDENCIES_FILE);

        let mut syncable: Vec<String> = Vec::new();
        let mut verify: Vec<String> = Vec::new();

        if dependencies_path.exists() {
            let content = std::fs::read_to_string(&dependencies_path)?;
            let dependencies = parse_dependencies(&content, &dependencies_path)?;
            debug!(path = %repo_path, count = dependencies.len(), "Read dependency file");

            let mut fetch_list = Vec::new();
            for dependency in dependencies {
                let target = dependency.target_path.clone();
                if !self.store.contains_path(&target) {
                    push_unique(&mut syncable, &target);
                    fetch_list.push(dependency);
                }
                if !root.join(&target).is_dir() {
                    push_unique(&mut syncable, &target);
                }
                verify.push(target);
            }

            if !fetch_list.is_empty() {
                println!("Adding dependencies to manifest");
                self.store.append_entries(&fetch_list, fallback_revision)?;
            }
        } else {
            println!("{} has no additional dependencies.", repo_path);
        }

        if !syncable.is_empty() {
            println!("Syncing dependencies");
            self.syncer.sync(&syncable);
        }

        for dependency in verify {
            self.fetch_dependencies(&dependency, None)?;
        }

        Ok(())
    }
}

fn push_unique(paths: &mut Vec<String>, path: &str) {
    if !paths.iter().any(|p| p == path) {
        paths.push(path.to_string());
    }
}
