//! XML manifest parser for git-repo compatible manifests
//!
//! Manifests are kept as a generic element tree so that a local manifest can
//! be rewritten without losing elements this tool does not model (`remote`,
//! `remove-project`, `linkfile`, ...). Typed accessors sit on top.

use crate::{Result, RoomserviceError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Root element name of every manifest
pub const MANIFEST_ROOT: &str = "manifest";

/// An XML element with ordered attributes and child elements
///
/// Text and comments are not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Direct children with the given element name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// A `<project>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Checkout path; absent when the manifest relies on the name
    pub path: Option<String>,

    /// Repository name relative to the remote (e.g. "LineageOS/android_vendor_foo")
    pub name: String,

    /// Remote name
    pub remote: Option<String>,

    /// Pinned revision
    pub revision: Option<String>,
}

impl Project {
    fn from_element(e: &Element) -> Option<Self> {
        Some(Self {
            path: e.attr("path").map(str::to_string),
            name: e.attr("name")?.to_string(),
            remote: e.attr("remote").map(str::to_string),
            revision: e.attr("revision").map(str::to_string),
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("project");
        if let Some(ref path) = self.path {
            element.set_attr("path", path);
        }
        if let Some(ref remote) = self.remote {
            element.set_attr("remote", remote);
        }
        element.set_attr("name", &self.name);
        if let Some(ref revision) = self.revision {
            element.set_attr("revision", revision);
        }
        element
    }
}

/// The `<default>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDefault {
    pub revision: Option<String>,
    pub remote: Option<String>,
}

/// A parsed manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    root: Element,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// Create an empty `<manifest/>` document
    pub fn new() -> Self {
        Self {
            root: Element::new(MANIFEST_ROOT),
        }
    }

    /// Parse a manifest from XML content
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        RoomserviceError::Parse("Unexpected closing tag in manifest".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(RoomserviceError::Parse(format!(
                        "Error parsing manifest XML: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(RoomserviceError::Parse(
                "Unclosed element in manifest".to_string(),
            ));
        }

        let root =
            root.ok_or_else(|| RoomserviceError::Parse("Manifest has no root element".to_string()))?;
        Ok(Self { root })
    }

    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Root element of the document
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// All `<project>` entries with a name
    pub fn projects(&self) -> Vec<Project> {
        self.root
            .children_named("project")
            .filter_map(Project::from_element)
            .collect()
    }

    /// True if any `<project>` has exactly this `path` attribute
    pub fn contains_path(&self, path: &str) -> bool {
        self.root
            .children_named("project")
            .any(|p| p.attr("path") == Some(path))
    }

    /// Find the project checked out at `path`
    pub fn project_at(&self, path: &str) -> Option<Project> {
        self.root
            .children_named("project")
            .find(|p| p.attr("path") == Some(path))
            .and_then(Project::from_element)
    }

    /// The first `<default>` element, if any
    pub fn default(&self) -> Option<ManifestDefault> {
        self.root
            .children_named("default")
            .next()
            .map(|d| ManifestDefault {
                revision: d.attr("revision").map(str::to_string),
                remote: d.attr("remote").map(str::to_string),
            })
    }

    /// `name` of the first `<include>` element, if any
    pub fn include(&self) -> Option<String> {
        self.root
            .children_named("include")
            .next()
            .and_then(|i| i.attr("name"))
            .map(str::to_string)
    }

    /// Append a `<project>` element at the end of the document
    pub fn push_project(&mut self, project: &Project) {
        self.root.children.push(project.to_element());
    }
}

fn element_from(e: &BytesStart) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|e| RoomserviceError::Parse(format!("Invalid attribute: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| RoomserviceError::Parse(format!("Invalid attribute value: {}", e)))?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(RoomserviceError::Parse(
            "Manifest has more than one root element".to_string(),
        ));
    }
    *root = Some(element);
    Ok(())
}
