//! Where Aggregate Results come from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crafd_common::{CrafdError, FacetSelection, Organization};
use crafd_engine::{aggregate, AggregateResult, FacetUniverse};

/// A failed fetch. Cloneable so the synchronizer can keep it as its error state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<FetchError> for CrafdError {
    fn from(err: FetchError) -> Self {
        CrafdError::Fetch(err.to_string())
    }
}

/// One dashboard fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub selection: FacetSelection,
    pub include_member_states: bool,
    /// The filter channel in canonical query form, for sources that speak HTTP.
    pub query: String,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<AggregateResult, FetchError>;

    fn name(&self) -> &str {
        "unknown"
    }
}

/// Runs the engine in process over an already-loaded graph.
pub struct LocalSource {
    organizations: Arc<Vec<Organization>>,
    universe: Arc<FacetUniverse>,
}

impl LocalSource {
    pub fn new(organizations: Arc<Vec<Organization>>, universe: Arc<FacetUniverse>) -> Self {
        Self {
            organizations,
            universe,
        }
    }
}

#[async_trait]
impl DataSource for LocalSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<AggregateResult, FetchError> {
        Ok(aggregate(&self.organizations, &request.selection, &self.universe))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Fetches from a running `crafd-web` service.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn dashboard_url(&self, query: &str) -> String {
        if query.is_empty() {
            format!("{}/api/dashboard", self.base_url)
        } else {
            format!("{}/api/dashboard?{}", self.base_url, query)
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<AggregateResult, FetchError> {
        let url = self.dashboard_url(&request.query);
        debug!(url = %url, "Fetching dashboard");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<AggregateResult>().await?)
    }

    fn name(&self) -> &str {
        "http"
    }
}
