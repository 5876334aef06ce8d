//! Sync trigger
//!
//! After new projects land in the local manifest they are force-synced with
//! repo. The result is only logged; a failed sync never stops a run.

use repo_sync::{Repo, SyncOptions};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Something that can check out a batch of project paths
pub trait SyncTrigger {
    fn sync(&self, paths: &[String]);
}

/// Runs `repo sync --force-sync <paths...>` in the checkout root
#[derive(Debug, Clone)]
pub struct RepoSync {
    repo: Repo,
}

impl RepoSync {
    pub fn new(root: impl Into<PathBuf>, program: &str) -> Self {
        Self {
            repo: Repo::with_workdir(root).with_program(program),
        }
    }
}

impl SyncTrigger for RepoSync {
    fn sync(&self, paths: &[String]) {
        if paths.is_empty() {
            return;
        }
        debug!(paths = ?paths, "Running repo sync");

        match self.repo.sync(paths, &SyncOptions::forced()) {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%status, paths = ?paths, "repo sync exited unsuccessfully"),
            Err(e) => warn!(error = %e, paths = ?paths, "repo sync could not be run"),
        }
    }
}
