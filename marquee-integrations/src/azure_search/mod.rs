//! Azure AI Search over its REST api.
//!
//! Every request authenticates with the admin key in the `api-key` header and targets the
//! `2024-07-01` api version. One [`AzureSearch`] instance is bound to one index.
use derive_builder::Builder;
use marquee_core::config::{SEARCH_API_VERSION, SearchServiceConfig};
use marquee_core::errors::SearchIndexError;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;

mod documents;
mod index;
mod query;

#[derive(Debug, Builder)]
#[builder(setter(into), build_fn(error = "anyhow::Error"))]
pub struct AzureSearch {
    #[builder(default)]
    client: reqwest::Client,
    /// Service url, e.g. `https://my-service.search.windows.net`
    endpoint: String,
    #[builder(setter(custom))]
    api_key: SecretString,
    index_name: String,
    #[builder(default = "SEARCH_API_VERSION.to_string()")]
    api_version: String,
}

impl AzureSearch {
    pub fn builder() -> AzureSearchBuilder {
        AzureSearchBuilder::default()
    }

    pub fn from_config(config: &SearchServiceConfig) -> Self {
        Self {
            client: reqwest::Client::default(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
            api_version: SEARCH_API_VERSION.to_string(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn url(&self, index: &str, path: &str) -> String {
        format!(
            "{}/indexes/{index}{path}",
            self.endpoint.trim_end_matches('/'),
        )
    }

    /// A request against `path` below the bound index
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.request_to(method, &self.index_name, path)
    }

    fn request_to(
        &self,
        method: reqwest::Method,
        index: &str,
        path: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(index, path))
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", self.api_key.expose_secret())
    }
}

impl AzureSearchBuilder {
    pub fn api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Turns a non success response into the message the service gave, or the raw body.
async fn error_message(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|body| body.error.message)
        .unwrap_or(body);

    (status, message)
}

async fn unexpected_response(response: reqwest::Response) -> SearchIndexError {
    let (status, message) = error_message(response).await;
    tracing::error!(status, message, "Unexpected response from search service");
    SearchIndexError::Response { status, message }
}
