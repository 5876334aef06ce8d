//! Build target parsing
//!
//! A lunch product such as `lineage_widget` names the device after the first
//! underscore. Device trees on GitHub follow the
//! `android_device_<manufacturer>_<device>` naming scheme.

use crate::integrations::RepositoryCandidate;
use regex::Regex;

/// Derive the device codename from a product identifier
///
/// Returns everything after the first `_`, or the whole identifier if it has
/// no underscore.
pub fn device_from_product(product: &str) -> &str {
    match product.split_once('_') {
        Some((_, device)) => device,
        None => product,
    }
}

/// A parsed invocation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Product as given on the command line
    pub product: String,

    /// Device codename derived from the product
    pub device: String,

    /// Only expand dependencies of an already checked-out device tree
    pub deps_only: bool,
}

impl Target {
    pub fn new(product: impl Into<String>, deps_only: bool) -> Self {
        let product = product.into();
        let device = device_from_product(&product).to_string();
        Self {
            product,
            device,
            deps_only,
        }
    }
}

/// A search result recognized as the device tree for a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTree {
    /// Repository name, e.g. `android_device_acme_widget`
    pub repository: String,

    /// Manufacturer segment, e.g. `acme`
    pub manufacturer: String,

    /// Checkout path, e.g. `device/acme/widget`
    pub path: String,
}

impl DeviceTree {
    /// Recognize `android_device_<manufacturer>_<device>`
    ///
    /// The manufacturer segment may not contain an underscore; the device
    /// segment must match literally.
    pub fn from_repository(repository: &str, device: &str) -> Option<Self> {
        let pattern = Regex::new(&format!(
            "^android_device_([^_]*)_{}$",
            regex::escape(device)
        ))
        .ok()?;
        let manufacturer = pattern.captures(repository)?.get(1)?.as_str().to_string();

        Some(Self {
            repository: repository.to_string(),
            path: format!("device/{}/{}", manufacturer, device),
            manufacturer,
        })
    }
}

/// First search result, in API order, that is a device tree for `device`
pub fn find_device_tree<'a>(
    candidates: &'a [RepositoryCandidate],
    device: &str,
) -> Option<(&'a RepositoryCandidate, DeviceTree)> {
    candidates.iter().find_map(|candidate| {
        DeviceTree::from_repository(&candidate.name, device).map(|tree| (candidate, tree))
    })
}
