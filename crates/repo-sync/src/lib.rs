//! git-repo (`repo`) CLI wrapper for Rust
//!
//! A small, argv-only interface to the `repo` tool used to check out
//! multi-repository Android trees. Arguments are handed to the process
//! directly; nothing is routed through a shell.
//!
//! # Example
//!
//! ```no_run
//! use repo_sync::{Repo, SyncOptions};
//!
//! let repo = Repo::with_workdir("/src/android");
//!
//! // Force-sync two projects
//! let status = repo.sync(&["device/acme/widget", "vendor/acme"], &SyncOptions::forced())?;
//! println!("repo exited with {}", status);
//! # Ok::<(), repo_sync::Error>(())
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Errors that can occur when interacting with repo
#[derive(Error, Debug)]
pub enum Error {
    #[error("repo is not installed or not in PATH")]
    NotInstalled,

    #[error("Failed to execute repo command: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Flags accepted by `repo sync`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Overwrite an existing git directory if it needs to point to a different object directory
    pub force_sync: bool,

    /// Fetch only the current manifest branch
    pub current_branch: bool,

    /// Number of parallel jobs
    pub jobs: Option<u32>,
}

impl SyncOptions {
    /// Options for `repo sync --force-sync`
    pub fn forced() -> Self {
        Self {
            force_sync: true,
            ..Self::default()
        }
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.force_sync {
            args.push("--force-sync".to_string());
        }
        if self.current_branch {
            args.push("--current-branch".to_string());
        }
        if let Some(jobs) = self.jobs {
            args.push(format!("--jobs={}", jobs));
        }
        args
    }
}

/// repo CLI wrapper
#[derive(Debug, Clone)]
pub struct Repo {
    /// Program to execute
    program: OsString,
    /// Working directory (checkout root)
    workdir: Option<PathBuf>,
}

impl Default for Repo {
    fn default() -> Self {
        Self {
            program: OsString::from("repo"),
            workdir: None,
        }
    }
}

impl Repo {
    /// Create a new Repo instance, failing if `repo` cannot be executed
    pub fn new() -> Result<Self> {
        let repo = Self::default();
        if !repo.is_available() {
            return Err(Error::NotInstalled);
        }
        Ok(repo)
    }

    /// Create with a specific working directory
    pub fn with_workdir(path: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(path.into()),
            ..Self::default()
        }
    }

    /// Use a different executable instead of `repo` from PATH
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Check if repo is available
    pub fn is_available(&self) -> bool {
        self.command(&["--version"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run `repo sync` for the given project paths
    ///
    /// stdout/stderr are inherited so the user sees repo's progress output.
    /// Returns the exit status; a non-zero status is not turned into an error.
    pub fn sync<S: AsRef<str>>(&self, paths: &[S], options: &SyncOptions) -> Result<ExitStatus> {
        let args = self.sync_args(paths, options);

        let status = self
            .command(args.as_slice())
            .status()
            .map_err(|e| Error::CommandFailed(format!("{}: {}", self.program.to_string_lossy(), e)))?;
        Ok(status)
    }

    /// Build the argument vector for a sync call without running it
    pub fn sync_args<S: AsRef<str>>(&self, paths: &[S], options: &SyncOptions) -> Vec<String> {
        let mut args = vec!["sync".to_string()];
        args.extend(options.to_args());
        args.extend(paths.iter().map(|p| p.as_ref().to_string()));
        args
    }

    fn command<S: AsRef<std::ffi::OsStr>>(&self, args: &[S]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);

        if let Some(ref dir) = self.workdir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_sync_args() {
        let repo = Repo::default();
        let args = repo.sync_args(&["vendor/foo", "device/acme/widget"], &SyncOptions::forced());
        assert_eq!(
            args,
            vec!["sync", "--force-sync", "vendor/foo", "device/acme/widget"]
        );
    }

    #[test]
    fn test_sync_args_with_all_options() {
        let options = SyncOptions {
            force_sync: true,
            current_branch: true,
            jobs: Some(8),
        };
        let args = Repo::default().sync_args(&["vendor/foo"], &options);
        assert_eq!(
            args,
            vec![
                "sync",
                "--force-sync",
                "--current-branch",
                "--jobs=8",
                "vendor/foo"
            ]
        );
    }

    #[test]
    fn test_paths_are_not_shell_split() {
        let args = Repo::default().sync_args(&["vendor/foo; rm -rf /"], &SyncOptions::default());
        assert_eq!(args, vec!["sync", "vendor/foo; rm -rf /"]);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let repo = Repo::default().with_program("repo-sync-test-definitely-missing");
        assert!(!repo.is_available());
        assert!(repo.sync(&["vendor/foo"], &SyncOptions::forced()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported_not_raised() {
        let repo = Repo::default().with_program("false");
        let status = repo.sync(&["vendor/foo"], &SyncOptions::forced()).unwrap();
        assert!(!status.success());
    }

    // Integration tests (require repo to be installed)
    #[test]
    #[ignore]
    fn test_repo_available() {
        assert!(Repo::new().is_ok());
    }
}
