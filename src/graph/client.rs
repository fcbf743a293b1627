//! HTTP client for the build-graph (Maestro) REST API.
//!
//! Two endpoints are used:
//! - `GET /api/builds/latest?repository=..&channelId=..` - latest build of a repository on a channel
//! - `GET /api/builds/{id}/graph` - the build graph rooted at a build
//!
//! Both take the pinned `api-version` query parameter and an optional bearer
//! token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::{Build, BuildGraph, BuildGraphProvider, BuildId, BuildSummary};
use crate::constants::{BUILD_GRAPH_API_VERSION, HTTP_REQUEST_TIMEOUT, USER_AGENT};
use crate::core::DepflowError;

/// Wire shape of the graph endpoint: builds keyed by their id rendered as a string.
#[derive(Debug, Deserialize)]
struct BuildGraphResponse {
    builds: HashMap<String, Build>,
}

impl TryFrom<BuildGraphResponse> for BuildGraph {
    type Error = DepflowError;

    fn try_from(response: BuildGraphResponse) -> Result<Self, Self::Error> {
        for (key, build) in &response.builds {
            if key.parse::<i64>().ok() != Some(build.id.0) {
                return Err(DepflowError::BuildGraphRequestFailed {
                    operation: "decode build graph".to_string(),
                    reason: format!("graph key '{key}' does not match build id {}", build.id),
                });
            }
        }
        Ok(Self::new(response.builds.into_values()))
    }
}

/// Build-graph provider backed by the Maestro REST API.
#[derive(Debug, Clone)]
pub struct BuildGraphClient {
    client: Client,
    base_url: String,
}

impl BuildGraphClient {
    /// Create a client for `base_url`, authenticating with `token` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Build graph token contains invalid characters")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for the build graph provider")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, DepflowError> {
        let failed = |reason: String| DepflowError::BuildGraphRequestFailed {
            operation: operation.to_string(),
            reason,
        };

        debug!("GET {} ({})", url, operation);
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("api-version", BUILD_GRAPH_API_VERSION)])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("HTTP {status}: {body}")));
        }

        response.json::<T>().await.map(Some).map_err(|e| failed(e.to_string()))
    }
}

#[async_trait]
impl BuildGraphProvider for BuildGraphClient {
    async fn get_latest(&self, repository: &str, channel_id: u32) -> Result<BuildSummary> {
        let url = format!("{}/api/builds/latest", self.base_url);
        let query =
            [("repository", repository.to_string()), ("channelId", channel_id.to_string())];

        let latest = self.get_json::<BuildSummary>("get latest build", &url, &query).await?;
        latest.ok_or_else(|| {
            DepflowError::LatestBuildNotFound {
                repository: repository.to_string(),
                channel_id,
            }
            .into()
        })
    }

    async fn get_build_graph(&self, build_id: BuildId) -> Result<BuildGraph> {
        let url = format!("{}/api/builds/{}/graph", self.base_url, build_id);

        let response =
            self.get_json::<BuildGraphResponse>("get build graph", &url, &[]).await?.ok_or_else(
                || DepflowError::BuildGraphRequestFailed {
                    operation: "get build graph".to_string(),
                    reason: format!("build {build_id} not found"),
                },
            )?;

        Ok(BuildGraph::try_from(response)?)
    }
}
