//! Manifest handling for repo checkouts
//!
//! Parses and writes XML manifests compatible with Google's git-repo tool and
//! maintains roomservice's own local manifest.
//!
//! # Example Local Manifest
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <manifest>
//!   <project path="device/acme/widget" remote="github" name="LineageOS/android_device_acme_widget"/>
//!   <project path="vendor/acme" remote="github" name="LineageOS/android_vendor_acme" revision="lineage-20"/>
//! </manifest>
//! ```

mod parser;
mod store;
mod writer;

pub use parser::{Element, Manifest, ManifestDefault, Project, MANIFEST_ROOT};
pub use store::{
    strip_ref_prefix, LoadedManifest, ManifestSource, ManifestStore, LOCAL_MANIFEST_PATH,
    MANIFESTS_DIR, MANIFEST_PATH, SNIPPET_PATH,
};
pub use writer::to_xml_string;
