//! Manifest store
//!
//! Reads the writable local manifest and the two read-only manifests a repo
//! checkout provides, answers membership questions over all three and appends
//! new projects to the local manifest.

use super::parser::{Manifest, Project};
use super::writer::to_xml_string;
use crate::dependencies::DependencyRecord;
use crate::{Result, RoomserviceError};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Top-level manifest maintained by repo
pub const MANIFEST_PATH: &str = ".repo/manifest.xml";

/// Directory holding the manifest repository checkout
pub const MANIFESTS_DIR: &str = ".repo/manifests";

/// LineageOS snippet with additional projects
pub const SNIPPET_PATH: &str = ".repo/manifests/snippets/lineage.xml";

/// Local manifest owned by roomservice
pub const LOCAL_MANIFEST_PATH: &str = ".repo/local_manifests/roomservice.xml";

/// The manifests consulted for membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSource {
    /// `.repo/local_manifests/roomservice.xml`
    Local,
    /// The manifest holding the `<default>` element
    Primary,
    /// `.repo/manifests/snippets/lineage.xml`
    Snippet,
}

impl ManifestSource {
    pub const ALL: [ManifestSource; 3] = [
        ManifestSource::Local,
        ManifestSource::Primary,
        ManifestSource::Snippet,
    ];
}

/// Result of loading a manifest that may not exist
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// Parsed document, or an empty `<manifest/>` when unavailable
    pub manifest: Manifest,

    /// False if the file was missing or could not be parsed
    pub was_present: bool,
}

/// Access to the manifests of one repo checkout
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
    org: String,
    remote: String,
}

impl ManifestStore {
    /// Create a store for the checkout at `root`
    ///
    /// New projects are named `{org}/{repository}` and use `remote`.
    pub fn new(root: impl Into<PathBuf>, org: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            org: org.into(),
            remote: remote.into(),
        }
    }

    /// Checkout root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of the local manifest
    pub fn local_manifest_path(&self) -> PathBuf {
        self.root.join(LOCAL_MANIFEST_PATH)
    }

    /// Load one of the three manifests, never failing
    pub fn load(&self, source: ManifestSource) -> LoadedManifest {
        match source {
            ManifestSource::Local => load_or_empty(&self.local_manifest_path()),
            ManifestSource::Snippet => load_or_empty(&self.root.join(SNIPPET_PATH)),
            ManifestSource::Primary => match self.resolve_manifest_path() {
                Ok(path) => load_or_empty(&path),
                Err(e) => {
                    debug!(error = %e, "Primary manifest unavailable");
                    LoadedManifest {
                        manifest: Manifest::new(),
                        was_present: false,
                    }
                }
            },
        }
    }

    /// True if any of the three manifests has a project at `path`
    pub fn contains_path(&self, path: &str) -> bool {
        ManifestSource::ALL
            .iter()
            .any(|source| self.load(*source).manifest.contains_path(path))
    }

    /// Append entries that are not yet in any manifest and write the local
    /// manifest
    ///
    /// An entry's own branch wins over `fallback_revision`; with neither, the
    /// revision attribute is omitted and repo uses the manifest default.
    /// Returns how many projects were added. Nothing is written when that is
    /// zero.
    pub fn append_entries(
        &self,
        entries: &[DependencyRecord],
        fallback_revision: Option<&str>,
    ) -> Result<usize> {
        let mut local = self.load(ManifestSource::Local).manifest;
        let mut added = 0;

        for entry in entries {
            println!(
                "Checking if {} is fetched from {}",
                entry.target_path, entry.repository
            );
            if local.contains_path(&entry.target_path) || self.contains_path(&entry.target_path) {
                println!(
                    "{}/{} already fetched to {}",
                    self.org, entry.repository, entry.target_path
                );
                continue;
            }

            println!(
                "Adding dependency: {}/{} -> {}",
                self.org, entry.repository, entry.target_path
            );

            let revision = match (&entry.branch, fallback_revision) {
                (Some(branch), _) => Some(branch.clone()),
                (None, Some(fallback)) => {
                    println!(
                        "Using fallback branch {} for {}",
                        fallback, entry.repository
                    );
                    Some(fallback.to_string())
                }
                (None, None) => {
                    println!("Using default branch for {}", entry.repository);
                    None
                }
            };

            local.push_project(&Project {
                path: Some(entry.target_path.clone()),
                name: format!("{}/{}", self.org, entry.repository),
                remote: Some(self.remote.clone()),
                revision,
            });
            added += 1;
        }

        if added > 0 {
            self.write_local(&local)?;
        }

        Ok(added)
    }

    /// Replace the local manifest on disk
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it. An existing file keeps its permissions; a new one is
    /// created world-readable (0644 on Unix).
    pub fn write_local(&self, manifest: &Manifest) -> Result<()> {
        let path = self.local_manifest_path();
        let dir = path
            .parent()
            .ok_or_else(|| RoomserviceError::Other("Local manifest has no parent".to_string()))?;
        std::fs::create_dir_all(dir)?;

        let xml = to_xml_string(manifest)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(xml.as_bytes())?;
        if let Some(permissions) = target_permissions(&path)? {
            std::fs::set_permissions(file.path(), permissions)?;
        }
        file.persist(&path).map_err(|e| RoomserviceError::Io(e.error))?;

        info!(path = %path.display(), projects = manifest.projects().len(), "Wrote local manifest");
        Ok(())
    }

    /// Find the file holding the `<default>` element
    ///
    /// Older repo versions keep it in `.repo/manifest.xml`; newer ones make
    /// that file a stub including a file from `.repo/manifests`.
    pub fn resolve_manifest_path(&self) -> Result<PathBuf> {
        let top = self.root.join(MANIFEST_PATH);
        let manifest = Manifest::from_file(&top)?;

        if manifest.default().is_some() {
            return Ok(top);
        }
        if let Some(include) = manifest.include() {
            return Ok(self.root.join(MANIFESTS_DIR).join(include));
        }

        Err(RoomserviceError::ManifestStructure(format!(
            "{} has neither a <default> nor an <include>",
            top.display()
        )))
    }

    /// Default revision of the checkout without `refs/heads/` or `refs/tags/`
    pub fn default_revision(&self) -> Result<String> {
        let path = self.resolve_manifest_path()?;
        let manifest = Manifest::from_file(&path)?;

        let revision = manifest
            .default()
            .and_then(|d| d.revision)
            .ok_or_else(|| {
                RoomserviceError::ManifestStructure(format!(
                    "{} has no default revision",
                    path.display()
                ))
            })?;

        Ok(strip_ref_prefix(&revision).to_string())
    }

    /// Path of an already-added device tree for `device`
    ///
    /// Used in deps-only mode: scans the local manifest for a project named
    /// like `android_device_<anything>_<device>`.
    pub fn find_device_path(&self, device: &str) -> Result<Option<String>> {
        let pattern = Regex::new(&format!("android_device_.*_{}$", regex::escape(device)))
            .map_err(|e| RoomserviceError::Other(format!("Invalid device pattern: {}", e)))?;

        Ok(self
            .load(ManifestSource::Local)
            .manifest
            .projects()
            .into_iter()
            .find(|p| pattern.is_match(&p.name))
            .and_then(|p| p.path))
    }
}

/// Strip a leading `refs/heads/` or `refs/tags/`
pub fn strip_ref_prefix(revision: &str) -> &str {
    revision
        .strip_prefix("refs/heads/")
        .or_else(|| revision.strip_prefix("refs/tags/"))
        .unwrap_or(revision)
}

/// Permissions for a rewritten file: the current file's, or 0644 when new
fn target_permissions(path: &Path) -> Result<Option<std::fs::Permissions>> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.permissions())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

fn load_or_empty(path: &Path) -> LoadedManifest {
    if !path.exists() {
        return LoadedManifest {
            manifest: Manifest::new(),
            was_present: false,
        };
    }

    match Manifest::from_file(path) {
        Ok(manifest) => LoadedManifest {
            manifest,
            was_present: true,
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable manifest");
            LoadedManifest {
                manifest: Manifest::new(),
                was_present: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn checkout() -> (TempDir, ManifestStore) {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            MANIFEST_PATH,
            r#"<manifest><include name="default.xml" /></manifest>"#,
        );
        write(
            temp.path(),
            ".repo/manifests/default.xml",
            r#"<manifest>
                 <default revision="refs/heads/lineage-20" remote="github" />
                 <project path="build/make" name="LineageOS/android_build" />
               </manifest>"#,
        );
        write(
            temp.path(),
            SNIPPET_PATH,
            r#"<manifest><project path="vendor/lineage" name="LineageOS/android_vendor_lineage" /></manifest>"#,
        );
        let store = ManifestStore::new(temp.path(), "LineageOS", "github");
        (temp, store)
    }

    fn record(repository: &str, target_path: &str, branch: Option<&str>) -> DependencyRecord {
        DependencyRecord {
            repository: repository.to_string(),
            target_path: target_path.to_string(),
            branch: branch.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_manifest_path_follows_include() {
        let (temp, store) = checkout();
        assert_eq!(
            store.resolve_manifest_path().unwrap(),
            temp.path().join(".repo/manifests/default.xml")
        );
    }

    #[test]
    fn test_resolve_manifest_path_direct_default() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            MANIFEST_PATH,
            r#"<manifest><default revision="main" /></manifest>"#,
        );
        let store = ManifestStore::new(temp.path(), "LineageOS", "github");
        assert_eq!(
            store.resolve_manifest_path().unwrap(),
            temp.path().join(MANIFEST_PATH)
        );
    }

    #[test]
    fn test_resolve_manifest_path_without_default_or_include() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), MANIFEST_PATH, "<manifest><remote name=\"x\" /></manifest>");
        let store = ManifestStore::new(temp.path(), "LineageOS", "github");

        let err = store.resolve_manifest_path().unwrap_err();
        assert!(matches!(err, RoomserviceError::ManifestStructure(_)));
    }

    #[test]
    fn test_default_revision_strips_prefix() {
        let (_temp, store) = checkout();
        assert_eq!(store.default_revision().unwrap(), "lineage-20");
    }

    #[test]
    fn test_strip_ref_prefix() {
        assert_eq!(strip_ref_prefix("refs/heads/lineage-20"), "lineage-20");
        assert_eq!(strip_ref_prefix("refs/tags/v1.0"), "v1.0");
        assert_eq!(strip_ref_prefix("lineage-20"), "lineage-20");
    }

    #[test]
    fn test_load_missing_and_garbage() {
        let (temp, store) = checkout();
        let loaded = store.load(ManifestSource::Local);
        assert!(!loaded.was_present);
        assert!(loaded.manifest.projects().is_empty());

        write(temp.path(), LOCAL_MANIFEST_PATH, "<manifest><oops>");
        let loaded = store.load(ManifestSource::Local);
        assert!(!loaded.was_present);

        assert!(store.load(ManifestSource::Primary).was_present);
        assert!(store.load(ManifestSource::Snippet).was_present);
    }

    #[test]
    fn test_contains_path_union() {
        let (temp, store) = checkout();
        write(
            temp.path(),
            LOCAL_MANIFEST_PATH,
            r#"<manifest><project path="device/acme/widget" name="LineageOS/android_device_acme_widget" /></manifest>"#,
        );

        assert!(store.contains_path("device/acme/widget"));
        assert!(store.contains_path("build/make"));
        assert!(store.contains_path("vendor/lineage"));
        assert!(!store.contains_path("vendor/foo"));
    }

    #[test]
    fn test_append_entries_revision_precedence() {
        let (_temp, store) = checkout();
        let added = store
            .append_entries(
                &[
                    record("android_vendor_foo", "vendor/foo", Some("staging")),
                    record("android_vendor_bar", "vendor/bar", None),
                ],
                Some("lineage-19.1"),
            )
            .unwrap();
        assert_eq!(added, 2);

        let local = store.load(ManifestSource::Local).manifest;
        let foo = local.project_at("vendor/foo").unwrap();
        assert_eq!(foo.name, "LineageOS/android_vendor_foo");
        assert_eq!(foo.remote.as_deref(), Some("github"));
        assert_eq!(foo.revision.as_deref(), Some("staging"));
        assert_eq!(
            local.project_at("vendor/bar").unwrap().revision.as_deref(),
            Some("lineage-19.1")
        );
    }

    #[test]
    fn test_append_entries_without_revision() {
        let (_temp, store) = checkout();
        store
            .append_entries(&[record("android_vendor_foo", "vendor/foo", None)], None)
            .unwrap();

        let project = store
            .load(ManifestSource::Local)
            .manifest
            .project_at("vendor/foo")
            .unwrap();
        assert_eq!(project.revision, None);
    }

    #[test]
    fn test_append_entries_is_idempotent() {
        let (_temp, store) = checkout();
        let entries = [record("android_vendor_foo", "vendor/foo", None)];

        assert_eq!(store.append_entries(&entries, None).unwrap(), 1);
        assert_eq!(store.append_entries(&entries, None).unwrap(), 0);

        let local = store.load(ManifestSource::Local).manifest;
        let count = local
            .projects()
            .iter()
            .filter(|p| p.path.as_deref() == Some("vendor/foo"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_append_entries_skips_external_and_in_batch_duplicates() {
        let (_temp, store) = checkout();
        let added = store
            .append_entries(
                &[
                    record("android_build", "build/make", None),
                    record("android_vendor_foo", "vendor/foo", None),
                    record("android_vendor_foo_fork", "vendor/foo", None),
                ],
                None,
            )
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(
            store
                .load(ManifestSource::Local)
                .manifest
                .project_at("vendor/foo")
                .unwrap()
                .name,
            "LineageOS/android_vendor_foo"
        );
    }

    #[test]
    fn test_append_nothing_does_not_create_file() {
        let (_temp, store) = checkout();
        let added = store
            .append_entries(&[record("android_build", "build/make", None)], None)
            .unwrap();
        assert_eq!(added, 0);
        assert!(!store.local_manifest_path().exists());
    }

    #[test]
    fn test_write_preserves_foreign_elements() {
        let (temp, store) = checkout();
        write(
            temp.path(),
            LOCAL_MANIFEST_PATH,
            r#"<manifest>
                 <remove-project name="LineageOS/android_packages_apps_Old" />
                 <project path="a" name="x/a"><linkfile src="s" dest="d" /></project>
               </manifest>"#,
        );

        store
            .append_entries(&[record("android_vendor_foo", "vendor/foo", None)], None)
            .unwrap();

        let content = fs::read_to_string(store.local_manifest_path()).unwrap();
        assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(content.contains("remove-project"));
        assert!(content.contains("<linkfile src=\"s\" dest=\"d\"/>"));
        assert!(content.contains("vendor/foo"));
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = ManifestStore::new(temp.path(), "Org", "github");

        let mut manifest = Manifest::new();
        manifest.push_project(&Project {
            path: Some("vendor/foo".to_string()),
            name: "Org/a".to_string(),
            remote: Some("github".to_string()),
            revision: Some("main".to_string()),
        });
        store.write_local(&manifest).unwrap();

        assert!(store.contains_path("vendor/foo"));
        let loaded = store.load(ManifestSource::Local);
        assert!(loaded.was_present);
        assert_eq!(
            loaded.manifest.project_at("vendor/foo").unwrap().revision.as_deref(),
            Some("main")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_local_manifest_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, store) = checkout();
        let path = store.local_manifest_path();
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;

        store
            .append_entries(&[record("android_vendor_foo", "vendor/foo", None)], None)
            .unwrap();
        assert_eq!(mode(&path), 0o644);

        // An existing file keeps whatever mode it was given
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        store
            .append_entries(&[record("android_vendor_bar", "vendor/bar", None)], None)
            .unwrap();
        assert_eq!(mode(&path), 0o640);
        assert!(store.contains_path("vendor/bar"));
    }

    #[test]
    fn test_find_device_path() {
        let (temp, store) = checkout();
        write(
            temp.path(),
            LOCAL_MANIFEST_PATH,
            r#"<manifest>
                 <project path="vendor/acme" name="LineageOS/android_vendor_acme" />
                 <project path="device/acme/widget" name="LineageOS/android_device_acme_widget" />
               </manifest>"#,
        );

        assert_eq!(
            store.find_device_path("widget").unwrap().as_deref(),
            Some("device/acme/widget")
        );
        assert_eq!(store.find_device_path("gadget").unwrap(), None);
        // Device names are matched literally
        assert_eq!(store.find_device_path("w.dget").unwrap(), None);
    }
}
