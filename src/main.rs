//! roomservice - fetch device trees into a repo checkout
//!
//! Main entry point for the roomservice CLI.

use clap::Parser;
use roomservice::config::{parse_branch_list, RoomserviceConfig, BRANCHES_ENV};
use roomservice::target::Target;
use roomservice::{Outcome, Roomservice};
use std::path::PathBuf;
use std::process;

/// Retrieve a device tree and its dependencies into .repo/local_manifests
#[derive(Parser, Debug)]
#[command(name = "roomservice")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Lunch product, e.g. lineage_widget
    product: String,

    /// Any non-empty value: only expand dependencies of an existing device tree
    depsonly: Option<String>,

    /// Space-separated fallback revisions tried when the default is missing
    #[arg(long, env = BRANCHES_ENV)]
    branches: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "ROOMSERVICE_API_URL")]
    api_url: Option<String>,

    /// GitHub organization hosting device trees
    #[arg(long, env = "ROOMSERVICE_ORG")]
    org: Option<String>,

    /// Checkout root containing .repo/
    #[arg(long, env = "ROOMSERVICE_ROOT")]
    root: Option<PathBuf>,

    /// netrc file with API credentials (default: ~/.netrc)
    #[arg(long, env = "NETRC")]
    netrc: Option<PathBuf>,

    /// Path to config file (default: ~/.config/roomservice/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn deps_only(&self) -> bool {
        self.depsonly.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Layer command-line and environment values over the config file
    fn apply(&self, config: &mut RoomserviceConfig) {
        if let Some(ref branches) = self.branches {
            config.fallback_branches = parse_branch_list(branches);
        }
        if let Some(ref api_url) = self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(ref org) = self.org {
            config.org = org.clone();
        }
        if let Some(ref root) = self.root {
            config.root = root.clone();
        }
        if let Some(ref netrc) = self.netrc {
            config.netrc = Some(netrc.clone());
        }
    }
}

fn main() {
    // Initialize logging
    if let Err(e) = roomservice::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => tracing::debug!(?outcome, "Finished"),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> roomservice::Result<Outcome> {
    let mut config = match cli.config {
        Some(ref path) => RoomserviceConfig::load(path)?,
        None => RoomserviceConfig::load_or_default(RoomserviceConfig::default_path())?,
    };
    cli.apply(&mut config);

    tracing::info!(
        org = %config.org,
        root = %config.root.display(),
        fallbacks = ?config.fallback_branches,
        "Configuration loaded"
    );

    let target = Target::new(cli.product.clone(), cli.deps_only());
    let roomservice = Roomservice::from_config(config)?;

    // Requests are awaited one at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(roomservice.run(&target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_positional_arguments() {
        let cli = Cli::try_parse_from(["roomservice", "lineage_widget"]).unwrap();
        assert_eq!(cli.product, "lineage_widget");
        assert!(!cli.deps_only());

        let cli = Cli::try_parse_from(["roomservice", "lineage_widget", "true"]).unwrap();
        assert!(cli.deps_only());

        let cli = Cli::try_parse_from(["roomservice", "lineage_widget", ""]).unwrap();
        assert!(!cli.deps_only());
    }

    #[test]
    fn test_cli_requires_product() {
        assert!(Cli::try_parse_from(["roomservice"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "roomservice",
            "lineage_widget",
            "--branches",
            "lineage-21 lineage-20",
            "--org",
            "MyOrg",
            "--root",
            "/src/android",
        ])
        .unwrap();

        let mut config = RoomserviceConfig::new();
        cli.apply(&mut config);
        assert_eq!(config.fallback_branches, vec!["lineage-21", "lineage-20"]);
        assert_eq!(config.org, "MyOrg");
        assert_eq!(config.root, PathBuf::from("/src/android"));
        assert_eq!(config.remote, "github");
    }
}
