//! Revision selection for a device tree
//!
//! The checkout's default revision is preferred. Releases are often tags, so
//! tags are consulted when no branch matches, and the configured fallback
//! list is walked last.

use crate::integrations::{GitHubClient, RepositoryCandidate};
use crate::Result;
use tracing::debug;

/// Outcome of revision selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The default revision exists; no explicit revision is needed
    Default,

    /// The default is missing; use this fallback instead
    Fallback(String),

    /// Neither the default nor any fallback exists
    Unresolved {
        default_revision: String,
        /// Every branch and tag name seen, branches first
        known: Vec<String>,
    },
}

impl Resolution {
    /// Revision to pin in the manifest, if any
    pub fn revision(&self) -> Option<&str> {
        match self {
            Resolution::Fallback(name) => Some(name),
            _ => None,
        }
    }
}

/// Chooses a revision for a candidate repository
#[derive(Debug, Clone, Default)]
pub struct RevisionResolver {
    fallbacks: Vec<String>,
}

impl RevisionResolver {
    /// Create a resolver with an ordered list of fallback revisions
    pub fn new(fallbacks: Vec<String>) -> Self {
        Self { fallbacks }
    }

    /// Resolve against the candidate's branches, then its tags
    ///
    /// Tags are only fetched when the default is not a branch.
    pub async fn resolve(
        &self,
        client: &GitHubClient,
        candidate: &RepositoryCandidate,
        default_revision: &str,
    ) -> Result<Resolution> {
        let mut known = client.list_branches(candidate).await?;
        debug!(repository = %candidate.name, branches = known.len(), "Fetched branches");

        if !known.iter().any(|name| name == default_revision) {
            let tags = client.list_tags(candidate).await?;
            debug!(repository = %candidate.name, tags = tags.len(), "Fetched tags");
            known.extend(tags);
        }

        Ok(self.select(default_revision, known))
    }

    /// Pick a revision from an already-fetched list of names
    pub fn select(&self, default_revision: &str, known: Vec<String>) -> Resolution {
        if known.iter().any(|name| name == default_revision) {
            return Resolution::Default;
        }

        match self
            .fallbacks
            .iter()
            .find(|fallback| known.iter().any(|name| name == *fallback))
        {
            Some(fallback) => Resolution::Fallback(fallback.clone()),
            None => Resolution::Unresolved {
                default_revision: default_revision.to_string(),
                known,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_present() {
        let resolver = RevisionResolver::new(names(&["staging"]));
        assert_eq!(
            resolver.select("lineage-20", names(&["main", "lineage-20", "staging"])),
            Resolution::Default
        );
    }

    #[test]
    fn test_fallback_order_wins() {
        let resolver = RevisionResolver::new(names(&["staging", "lineage-19.1", "main"]));
        let resolution = resolver.select("lineage-20", names(&["main", "lineage-19.1"]));
        assert_eq!(resolution, Resolution::Fallback("lineage-19.1".to_string()));
        assert_eq!(resolution.revision(), Some("lineage-19.1"));
    }

    #[test]
    fn test_fallback_must_match_verbatim() {
        let resolver = RevisionResolver::new(names(&["staging", "lineage-20"]));
        let resolution = resolver.select("lineage-20", names(&["main", "lineage-20-release"]));
        assert_eq!(
            resolution,
            Resolution::Unresolved {
                default_revision: "lineage-20".to_string(),
                known: names(&["main", "lineage-20-release"]),
            }
        );
        assert_eq!(resolution.revision(), None);
    }

    #[test]
    fn test_no_fallbacks_configured() {
        let resolver = RevisionResolver::default();
        assert!(matches!(
            resolver.select("lineage-20", names(&["main"])),
            Resolution::Unresolved { .. }
        ));
    }

    fn candidate(server: &MockServer) -> RepositoryCandidate {
        RepositoryCandidate {
            name: "android_device_acme_widget".to_string(),
            branches_url: format!("{}/repos/o/widget/branches{{/branch}}", server.uri()),
            tags_url: format!("{}/repos/o/widget/tags{{/tag}}", server.uri()),
        }
    }

    #[tokio::test]
    async fn test_branch_match_skips_tags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/widget/branches"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[{"name": "lineage-20"}]"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/widget/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(0)
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let resolution = RevisionResolver::default()
            .resolve(&client, &candidate(&server), "lineage-20")
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Default);
    }

    #[tokio::test]
    async fn test_tag_match_and_tag_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/widget/branches"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"name": "main"}]"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/o/widget/tags"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[{"name": "lineage-20.0"}]"#),
            )
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), None).unwrap();
        let c = candidate(&server);

        let resolution = RevisionResolver::default()
            .resolve(&client, &c, "lineage-20.0")
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Default);

        let resolution = RevisionResolver::new(names(&["lineage-20.0", "main"]))
            .resolve(&client, &c, "lineage-21")
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Fallback("lineage-20.0".to_string()));
    }
}
