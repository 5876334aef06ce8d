//! GitHub REST client
//!
//! Searches an organization for device tree repositories and lists the
//! branches and tags of a candidate. Each request is attempted once.

use crate::config::Credentials;
use crate::{Result, RoomserviceError};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A repository returned by the search API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryCandidate {
    pub name: String,
    /// URI template such as `https://api.github.com/repos/o/r/branches{/branch}`
    pub branches_url: String,
    /// URI template such as `https://api.github.com/repos/o/r/tags{/tag}`
    pub tags_url: String,
}

impl RepositoryCandidate {
    /// Branches endpoint with the template suffix removed
    pub fn branches_endpoint(&self) -> String {
        self.branches_url.replace("{/branch}", "")
    }

    /// Tags endpoint with the template suffix removed
    pub fn tags_endpoint(&self) -> String {
        self.tags_url.replace("{/tag}", "")
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RepositoryCandidate>,
}

/// Branch or tag reference; only the name matters here
#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

/// GitHub API client
pub struct GitHubClient {
    client: Client,
    api_url: String,
    credentials: Option<Credentials>,
}

impl GitHubClient {
    /// Create a new client for `api_url` (e.g. "https://api.github.com")
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_url: impl Into<String>, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(concat!(
                        "roomservice/",
                        env!("CARGO_PKG_VERSION")
                    )),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github.v3+json"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Search `org` for repositories whose name contains `device`, forks included
    pub async fn search_repositories(
        &self,
        device: &str,
        org: &str,
    ) -> Result<Vec<RepositoryCandidate>> {
        let url = format!("{}/search/repositories", self.api_url);
        let query = search_query(device, org);
        info!(query = %query, "Searching GitHub");

        let response: SearchResponse = self.get_json(&url, &[("q", query.as_str())]).await?;

        debug!(count = response.items.len(), "Search returned candidates");
        Ok(response.items)
    }

    /// Names of all branches of a candidate
    pub async fn list_branches(&self, candidate: &RepositoryCandidate) -> Result<Vec<String>> {
        let refs: Vec<NamedRef> = self.get_json(&candidate.branches_endpoint(), &[]).await?;
        Ok(refs.into_iter().map(|r| r.name).collect())
    }

    /// Names of all tags of a candidate
    pub async fn list_tags(&self, candidate: &RepositoryCandidate) -> Result<Vec<String>> {
        let refs: Vec<NamedRef> = self.get_json(&candidate.tags_endpoint(), &[]).await?;
        Ok(refs.into_iter().map(|r| r.name).collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(ref creds) = self.credentials {
            request = request.basic_auth(&creds.login, Some(&creds.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RoomserviceError::Network(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoomserviceError::Network(format!(
                "GET {} returned HTTP {}: {}",
                url, status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RoomserviceError::Network(format!("Reading {} failed: {}", url, e)))?;

        serde_json::from_str(&body).map_err(|e| {
            RoomserviceError::Parse(format!("Unexpected response from {}: {}", url, e))
        })
    }
}

/// Search query for device trees of `device` in `org`
pub fn search_query(device: &str, org: &str) -> String {
    format!("{} user:{} in:name fork:true", device, org)
}
