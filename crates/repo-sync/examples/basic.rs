//! Basic usage example for the repo-sync crate
//!
//! To run this example from inside a repo checkout:
//! ```sh
//! cd crates/repo-sync
//! cargo run --example basic -- device/acme/widget
//! ```

use repo_sync::{Repo, Result, SyncOptions};

fn main() -> Result<()> {
    let repo = match Repo::new() {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("\nMake sure 'repo' is installed and in your PATH.");
            return Err(e);
        }
    };

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: basic <path>...");
        return Ok(());
    }

    let status = repo.sync(&paths, &SyncOptions::forced())?;
    println!("repo sync finished: {}", status);

    Ok(())
}
