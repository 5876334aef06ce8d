//! roomservice configuration file handling
//!
//! Loads the optional ~/.config/roomservice/config.yaml. Every value has a
//! default matching the LineageOS setup, and command-line/environment values
//! override whatever the file says.

use super::netrc::{self, Credentials, Netrc};
use crate::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Public GitHub REST API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Organization hosting device trees
pub const DEFAULT_ORG: &str = "LineageOS";

/// Remote name written into local manifest entries
pub const DEFAULT_REMOTE: &str = "github";

/// Environment variable holding the fallback revision list
pub const BRANCHES_ENV: &str = "ROOMSERVICE_BRANCHES";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_org() -> String {
    DEFAULT_ORG.to_string()
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_repo_program() -> String {
    "repo".to_string()
}

/// roomservice configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoomserviceConfig {
    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Organization searched for device trees and used as the name prefix
    #[serde(default = "default_org")]
    pub org: String,

    /// Remote attribute for new manifest entries
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Ordered fallback revisions tried when the default revision is missing
    #[serde(default)]
    pub fallback_branches: Vec<String>,

    /// Checkout root containing `.repo/`
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// netrc file used for API credentials (defaults to ~/.netrc)
    #[serde(default)]
    pub netrc: Option<PathBuf>,

    /// Executable used to sync projects
    #[serde(default = "default_repo_program")]
    pub repo_program: String,
}

impl RoomserviceConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self {
            api_url: default_api_url(),
            org: default_org(),
            remote: default_remote(),
            fallback_branches: Vec::new(),
            root: default_root(),
            netrc: None,
            repo_program: default_repo_program(),
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::RoomserviceError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading roomservice configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            api_url = %config.api_url,
            org = %config.org,
            fallbacks = config.fallback_branches.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load from `path`, or return defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::new())
        }
    }

    /// Get the default config path (~/.config/roomservice/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("roomservice");
        path.push("config.yaml");
        path
    }

    /// Host part of the API URL, used for the netrc lookup
    pub fn api_host(&self) -> Option<String> {
        reqwest::Url::parse(&self.api_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Look up API credentials in the netrc file
    ///
    /// Any failure (no home directory, missing or unreadable file, no entry)
    /// yields `None`; credentials are never required.
    pub fn credentials(&self) -> Option<Credentials> {
        let host = self.api_host()?;
        let path = self.netrc.clone().or_else(netrc::default_path)?;

        match Netrc::from_file(&path) {
            Ok(netrc) => {
                let creds = netrc.authenticator(&host);
                tracing::debug!(host = %host, found = creds.is_some(), "netrc lookup");
                creds
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "netrc not readable");
                None
            }
        }
    }
}

impl Default for RoomserviceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a whitespace-separated branch list, dropping empty items
pub fn parse_branch_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
