//! Remote client interface
//!
//! Defines the operations the adapters need from the Atlas control-plane API.
//! The adapters only see [`AtlasClient`]; [`http::HttpAtlasClient`] is the
//! production implementation.

pub mod http;

use async_trait::async_trait;

use crate::models::{AlertConfiguration, SearchIndex};

pub use http::HttpAtlasClient;

/// Client-side error types for structured error handling
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The addressed object does not exist (HTTP 404)
    NotFound { resource: String },
    /// Credentials missing, invalid or lacking permission (HTTP 401/403)
    Authentication { status: u16, details: String },
    /// Rate limiting error (HTTP 429)
    RateLimited { retry_after: Option<u64> },
    /// Request rejected by the API (HTTP 400/409/422)
    Validation { status: u16, details: String },
    /// Any other non-success status
    Http { status: u16, body: Option<String> },
    /// Network or connectivity error
    Network { details: String, retryable: bool },
    /// Response body did not match the expected shape
    MalformedResponse { details: String },
    /// Client could not be constructed from its settings
    Configuration { details: String },
}

impl ClientError {
    /// Whether repeating the same request may succeed. The client never
    /// retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RateLimited { .. } => true,
            ClientError::Network { retryable, .. } => *retryable,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::NotFound { resource } => write!(f, "{} not found", resource),
            ClientError::Authentication { status, details } => {
                write!(f, "Authentication error ({}): {}", status, details)
            }
            ClientError::RateLimited { retry_after } => {
                write!(f, "Rate limit exceeded")?;
                if let Some(after) = retry_after {
                    write!(f, " (retry after: {}s)", after)?;
                }
                Ok(())
            }
            ClientError::Validation { status, details } => {
                write!(f, "Request rejected ({}): {}", status, details)
            }
            ClientError::Http { status, body } => {
                write!(
                    f,
                    "HTTP error {}: {}",
                    status,
                    body.as_deref().unwrap_or("No body")
                )
            }
            ClientError::Network { details, .. } => write!(f, "Network error: {}", details),
            ClientError::MalformedResponse { details } => {
                write!(f, "Malformed response: {}", details)
            }
            ClientError::Configuration { details } => {
                write!(f, "Configuration error: {}", details)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Operations on alert configurations and search indexes.
#[async_trait]
pub trait AtlasClient: Send + Sync {
    async fn get_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<AlertConfiguration, ClientError>;

    async fn create_alert_configuration(
        &self,
        project_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration, ClientError>;

    async fn update_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration, ClientError>;

    async fn delete_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<(), ClientError>;

    async fn get_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index_id: &str,
    ) -> Result<SearchIndex, ClientError>;

    async fn create_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index: &SearchIndex,
    ) -> Result<SearchIndex, ClientError>;

    async fn update_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index_id: &str,
        index: &SearchIndex,
    ) -> Result<SearchIndex, ClientError>;

    async fn delete_search_index(
        &self,
        project_id: &str,
        cluster_name: &str,
        index_id: &str,
    ) -> Result<(), ClientError>;
}
