use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, RunnerError};

/// HTTP client bound to one Azure DevOps organization.
pub struct AzureDevOpsClient {
    client: Client,
    organization: Url,
    token: Token,
}

impl AzureDevOpsClient {
    /// Creates a client for `organization_url` (e.g. `https://dev.azure.com/acme`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot serve as a base
    /// for API routes.
    pub fn new(organization_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pipeline-runner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RunnerError::Config(format!("Failed to create HTTP client: {e}")))?;

        let organization = Url::parse(organization_url)
            .map_err(|e| RunnerError::Config(format!("Invalid organization URL: {e}")))?;

        if organization.cannot_be_a_base() {
            return Err(RunnerError::Config(format!(
                "Organization URL cannot be used as a base: {organization_url}"
            )));
        }

        Ok(Self {
            client,
            organization,
            token,
        })
    }

    /// Builds `<org>[/<project>]/_apis/<segments...>?<query>&api-version=<v>`.
    pub(super) fn api_url(
        &self,
        project: Option<&str>,
        segments: &[&str],
        api_version: &str,
        query: &[(&str, &str)],
    ) -> Result<Url> {
        let mut url = self.organization.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                RunnerError::Config(format!("Invalid organization URL: {}", self.organization))
            })?;
            path.pop_if_empty();
            if let Some(project) = project {
                path.push(project);
            }
            path.push("_apis");
            path.extend(segments.iter().filter(|s| !s.is_empty()));
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("api-version", api_version);
        }
        Ok(url)
    }

    pub(super) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{method} {url}");
        self.client
            .request(method, url)
            .basic_auth("", Some(self.token.as_str()))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(RunnerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Sends `request` and decodes the JSON response.
    pub(super) async fn send_json<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`Self::send_json`], but maps `404 Not Found` to `None`.
    pub(super) async fn send_optional<T>(&self, request: RequestBuilder) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Sends a request and returns the body as untyped JSON.
    pub(super) async fn send_value(&self, request: RequestBuilder) -> Result<Value> {
        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Envelope used by list endpoints.
#[derive(Debug, serde::Deserialize)]
pub(super) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}
