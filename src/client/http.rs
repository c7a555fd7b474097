//! reqwest-backed [`AtlasClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use url::Url;

use super::{AtlasClient, ClientError};
use crate::config::ProviderConfig;
use crate::models::{AlertConfiguration, SearchIndex};

const API_PREFIX: [&str; 3] = ["api", "atlas", "v1.0"];
const BODY_SNIPPET_CHARS: usize = 200;
const USER_AGENT: &str = concat!("atlas-provider/", env!("CARGO_PKG_VERSION"));

const ALERT_CONFIGURATION: &str = "alert configuration";
const SEARCH_INDEX: &str = "search index";

/// Talks to `{base_url}/api/atlas/v1.0/groups/{project}/...` with bearer auth.
pub struct HttpAtlasClient {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpAtlasClient {
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::Configuration {
            details: format!("invalid base url '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration {
                details: format!("base url '{}' cannot carry a path", base_url),
            });
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Configuration {
                details: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url,
            access_token,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.base_url,
            config.access_token.clone(),
            config.request_timeout(),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = %method, path = url.path(), "atlas api request");
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        resource: &str,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = check_status(builder.send().await?, resource).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedResponse {
            details: format!("{} body: {}", resource, e),
        })
    }

    async fn send_delete(&self, url: Url, resource: &str) -> Result<(), ClientError> {
        check_status(self.request(Method::DELETE, url).send().await?, resource).await?;
        Ok(())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Network {
            retryable: error.is_timeout() || error.is_connect(),
            details: error.to_string(),
        }
    }
}

/// Error detail from an Atlas error body, or a bounded snippet of the raw text.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(detail) = value.get("detail").and_then(|d| d.as_str())
    {
        return detail.to_string();
    }
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

async fn check_status(response: Response, resource: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound {
            resource: resource.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Authentication {
            status: status.as_u16(),
            details: error_detail(&body),
        },
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(retry_after = ?retry_after, "rate limited by Atlas API");
            ClientError::RateLimited { retry_after }
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation {
                status: status.as_u16(),
                details: error_detail(&body),
            }
        }
        _ => ClientError::Http {
            status: status.as_u16(),
            body: (!body.is_empty()).then(|| error_detail(&body)),
        },
    })
}

#[async_trait]
impl AtlasClient for HttpAtlasClient {
    async fn get_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<AlertConfiguration, ClientError> {
        let url = self.endpoint(&["groups", project_id, "alertConfigs", alert_id]);
        self.send_json::<(), _>(Method::GET, url, None, ALERT_CONFIGURATION)
            .await
    }

    async fn create_alert_configuration(
        &self,
        project_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration, ClientError> {
        let url = self.endpoint(&["groups", project_id, "alertConfigs"]);
        self.send_json(Method::POST, url, Some(alert), ALERT_CONFIGURATION)
            .await
    }

    async fn update_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration, ClientError> {
        let url = self.endpoint(&["groups", project_id, "alertConfigs", alert_id]);
        self.send_json(Method::PUT, url, Some(alert), ALERT_CONFIGURATION)
            .await
    }

    async fn delete_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["groups", project_id, "alertConfigs", alert_id]);
        self.send_delete(url, ALERT_CONFIGURATION).await
    }

    async fn get_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index_id: &str,
    ) -> Result<SearchIndex, ClientError> {
        let url = self.endpoint(&[
            "groups",
            project_id,
            "clusters",
            cluster_name,
            "fts",
            "indexes",
            index_id,
        ]);
        self.send_json::<(), _>(Method::GET, url, None, SEARCH_INDEX)
            .await
    }

    async fn create_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index: &SearchIndex,
    ) -> Result<SearchIndex, ClientError> {
        let url = self.endpoint(&[
            "groups",
            project_id,
            "clusters",
            cluster_name,
            "fts",
            "indexes",
        ]);
        self.send_json(Method::POST, url, Some(index), SEARCH_INDEX)
            .await
    }

    async fn update_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index_id: &str,
        index: &SearchIndex,
    ) -> Result<SearchIndex, ClientError> {
        let url = self.endpoint(&[
            "groups",
            project_id,
            "clusters",
            cluster_name,
            "fts",
            "indexes",
            index_id,
        ]);
        self.send_json(Method::PATCH, url, Some(index), SEARCH_INDEX)
            .await
    }

    async fn delete_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&[
            "groups",
            project_id,
            "clusters",
            cluster_name,
            "fts",
            "indexes",
            index_id,
        ]);
        self.send_delete(url, SEARCH_INDEX).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_escapes_segments() {
        let client =
            HttpAtlasClient::new("https://cloud.mongodb.com/", None, Duration::from_secs(5))
                .unwrap();
        let url = client.endpoint(&["groups", "p1", "clusters", "my cluster", "fts", "indexes"]);
        assert_eq!(
            url.as_str(),
            "https://cloud.mongodb.com/api/atlas/v1.0/groups/p1/clusters/my%20cluster/fts/indexes"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            HttpAtlasClient::new("mailto:ops@example.com", None, Duration::from_secs(5)),
            Err(ClientError::Configuration { .. })
        ));
        assert!(HttpAtlasClient::new("not a url", None, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_error_detail_prefers_atlas_detail() {
        let body = r#"{"detail":"Invalid metric name.","errorCode":"INVALID_METRIC_NAME","error":400}"#;
        assert_eq!(error_detail(body), "Invalid metric name.");

        let long = "x".repeat(500);
        assert_eq!(error_detail(&long).len(), BODY_SNIPPET_CHARS);
    }
}
