//! HTTP inventory source for the quake REST API

use std::time::Duration;

use async_trait::async_trait;
use quake_inventory::{AvailableResources, FetchError, RemoteInventorySource};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};

/// Path of the available-resources endpoint, relative to the REST URL
const AVAILABLE_RESOURCES_PATH: &str = "available-resources";

/// Fetches available resources over HTTP
///
/// Carries an already-obtained bearer token if one is configured; acquiring
/// or renewing tokens is the caller's business.
#[derive(Debug, Clone)]
pub struct HttpInventorySource {
    client: Client,
    base_url: Url,
    token: Option<String>,
    project: Option<String>,
}

impl HttpInventorySource {
    /// Create a new source
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    ///
    /// # Example
    /// ```no_run
    /// use std::time::Duration;
    /// use quake_client::HttpInventorySource;
    ///
    /// let source = HttpInventorySource::new("https://quake.example.com/rest/v1", Duration::from_secs(30))?
    ///     .with_token("secret")
    ///     .with_project("p-1234");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    /// Create a new source with a custom `reqwest::Client`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn with_client(base_url: impl AsRef<str>, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base(base_url.as_ref())?,
            token: None,
            project: None,
        })
    }

    /// Attach a bearer token to every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Scope requests to a project
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Build the available-resources URL
    fn resources_url(&self) -> Result<Url> {
        let mut url = self
            .base_url
            .join(AVAILABLE_RESOURCES_PATH)
            .map_err(ClientError::Url)?;
        if let Some(project) = &self.project {
            url.query_pairs_mut().append_pair("project", project);
        }
        Ok(url)
    }

    /// Perform a GET request and deserialize the response
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status,
                message: message.trim().to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch the available-resources document
    ///
    /// # Errors
    /// Returns an error if the request fails, the API returns a non-success
    /// status, or the body is not a valid inventory document.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn available_resources(&self) -> Result<AvailableResources> {
        let url = self.resources_url()?;
        debug!(%url, "fetching available resources");
        let resources: AvailableResources = self.get(url).await?;
        debug!(
            images = resources.images.len(),
            machine_sizes = resources.machine_sizes.len(),
            ssh_keys = resources.ssh_keys.len(),
            "available resources fetched"
        );
        Ok(resources)
    }
}

#[async_trait]
impl RemoteInventorySource for HttpInventorySource {
    async fn fetch(&self) -> std::result::Result<AvailableResources, FetchError> {
        self.available_resources().await.map_err(FetchError::from)
    }

    fn source_name(&self) -> &'static str {
        "quake-rest"
    }
}

/// Ensure the base URL ends with a slash so relative joins append
fn normalize_base(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}
