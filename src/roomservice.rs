//! Device tree retrieval workflow
//!
//! Normal mode searches GitHub for the device tree, picks a revision, records
//! it in the local manifest, syncs it and expands its dependencies.
//! Deps-only mode starts from a device tree already in the local manifest.

use crate::config::RoomserviceConfig;
use crate::dependencies::{DependencyRecord, DependencyWalker};
use crate::integrations::GitHubClient;
use crate::manifest::{ManifestStore, LOCAL_MANIFEST_PATH};
use crate::revision::{Resolution, RevisionResolver};
use crate::sync::{RepoSync, SyncTrigger};
use crate::target::{find_device_tree, Target};
use crate::Result;
use tracing::info;

/// How a run ended
///
/// Every variant is a clean termination; fatal problems are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The device tree was recorded, synced and its dependencies expanded
    DeviceTreeFetched { repository: String, path: String },

    /// Deps-only mode expanded the dependencies of an existing device tree
    DependenciesFetched { path: String },

    /// Deps-only mode found no device tree in the local manifest
    DeviceTreeMissing,

    /// No search result is a device tree for the device
    NotFound,

    /// The device tree has neither the default revision nor a fallback
    Unresolved {
        repository: String,
        default_revision: String,
        known: Vec<String>,
    },
}

/// Wires the search client, manifest store and sync trigger together
pub struct Roomservice {
    config: RoomserviceConfig,
    client: GitHubClient,
    store: ManifestStore,
    resolver: RevisionResolver,
    syncer: Box<dyn SyncTrigger>,
}

impl Roomservice {
    /// Build from configuration, syncing with the configured repo executable
    pub fn from_config(config: RoomserviceConfig) -> Result<Self> {
        let syncer = RepoSync::new(config.root.clone(), &config.repo_program);
        Self::new(config, Box::new(syncer))
    }

    /// Build with a custom sync trigger
    pub fn new(config: RoomserviceConfig, syncer: Box<dyn SyncTrigger>) -> Result<Self> {
        let client = GitHubClient::new(config.api_url.clone(), config.credentials())?;
        let store = ManifestStore::new(config.root.clone(), config.org.clone(), config.remote.clone());
        let resolver = RevisionResolver::new(config.fallback_branches.clone());

        Ok(Self {
            config,
            client,
            store,
            resolver,
            syncer,
        })
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Run for a target
    pub async fn run(&self, target: &Target) -> Result<Outcome> {
        info!(product = %target.product, device = %target.device, deps_only = target.deps_only, "Starting");

        if target.deps_only {
            self.fetch_dependencies_only(&target.device)
        } else {
            self.fetch_device_tree(&target.device).await
        }
    }

    fn fetch_dependencies_only(&self, device: &str) -> Result<Outcome> {
        match self.store.find_device_path(device)? {
            Some(path) => {
                DependencyWalker::new(&self.store, self.syncer.as_ref())
                    .fetch_dependencies(&path, None)?;
                Ok(Outcome::DependenciesFetched { path })
            }
            None => {
                println!("Trying dependencies-only mode on a non-existing device tree?");
                Ok(Outcome::DeviceTreeMissing)
            }
        }
    }

    async fn fetch_device_tree(&self, device: &str) -> Result<Outcome> {
        println!(
            "Device {} not found. Attempting to retrieve device repository from {} Github (http://github.com/{}).",
            device, self.config.org, self.config.org
        );

        let candidates = self
            .client
            .search_repositories(device, &self.config.org)
            .await?;

        let Some((candidate, tree)) = find_device_tree(&candidates, device) else {
            println!(
                "Repository for {} not found in the {} Github repository list. If this is in error, you may need to manually add it to your {}.",
                device, self.config.org, LOCAL_MANIFEST_PATH
            );
            return Ok(Outcome::NotFound);
        };
        println!("Found repository: {}", tree.repository);

        let default_revision = self.store.default_revision()?;
        println!("Default revision: {}", default_revision);
        println!("Checking branch info");

        let resolution = self
            .resolver
            .resolve(&self.client, candidate, &default_revision)
            .await?;

        if let Resolution::Unresolved {
            default_revision,
            known,
        } = resolution
        {
            println!(
                "Default revision {} not found in {}. Bailing.",
                default_revision, tree.repository
            );
            println!("Branches found:");
            for name in &known {
                println!("{}", name);
            }
            println!(
                "Use the {} environment variable to specify a list of fallback branches.",
                crate::config::BRANCHES_ENV
            );
            return Ok(Outcome::Unresolved {
                repository: tree.repository,
                default_revision,
                known,
            });
        }

        let fallback = resolution.revision();
        if let Some(name) = fallback {
            println!("Using fallback branch: {}", name);
        }

        let entry = DependencyRecord {
            repository: tree.repository.clone(),
            target_path: tree.path.clone(),
            branch: None,
        };
        self.store.append_entries(&[entry], fallback)?;

        println!("Syncing repository to retrieve project.");
        self.syncer.sync(std::slice::from_ref(&tree.path));
        println!("Repository synced!");

        DependencyWalker::new(&self.store, self.syncer.as_ref())
            .fetch_dependencies(&tree.path, fallback)?;
        println!("Done");

        Ok(Outcome::DeviceTreeFetched {
            repository: tree.repository,
            path: tree.path,
        })
    }
}
