//! Shared HTTP plumbing for the REST collaborators.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::{AdapterError, ConfigError};
use crate::secrets::{resolve_secret_optional, resolve_setting};

/// Subscription key header understood by every collaborator service.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Connection establishment timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-request timeout. The pipeline applies its own per-stage deadline on
/// top of this.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest error body kept in an `AdapterError::Status`.
const MAX_ERROR_BODY: usize = 512;

pub fn create_http_client() -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ConfigError::Validation {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Resolved endpoint and key of a collaborator.
#[derive(Clone)]
pub struct ServiceCredentials {
    pub endpoint: String,
    pub key: SecretString,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("endpoint", &self.endpoint)
            .field("key", &"****")
            .finish()
    }
}

impl ServiceCredentials {
    /// Builds `{endpoint}{path}` without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }
}

/// Resolves a service section into credentials.
///
/// Returns `None` when either the endpoint or the key is missing, which the
/// adapters report as [`AdapterError::Unavailable`] when called.
pub fn resolve_service(
    name: &str,
    config: &ServiceConfig,
    default_endpoint_env: &str,
    default_key_env: &str,
    default_endpoint: Option<&str>,
) -> Result<Option<ServiceCredentials>, ConfigError> {
    let endpoint = resolve_setting(
        config.endpoint.as_deref(),
        Some(config.endpoint_env.as_deref().unwrap_or(default_endpoint_env)),
    )
    .or_else(|| default_endpoint.map(str::to_string));

    let key = resolve_secret_optional(
        config.key.as_deref(),
        config.key_file.as_deref(),
        Some(config.key_env.as_deref().unwrap_or(default_key_env)),
    )
    .map_err(|e| ConfigError::Secret {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    match (endpoint, key) {
        (Some(endpoint), Some(key)) => Ok(Some(ServiceCredentials { endpoint, key })),
        (endpoint, key) => {
            log::debug!(
                "{} not configured (endpoint: {}, key: {})",
                name,
                endpoint.is_some(),
                key.is_some()
            );
            Ok(None)
        }
    }
}

/// Attaches the subscription key header.
pub fn authorize(request: RequestBuilder, credentials: &ServiceCredentials) -> RequestBuilder {
    request.header(SUBSCRIPTION_KEY_HEADER, credentials.key.expose_secret())
}

/// Sends a request and decodes a JSON response body.
pub async fn send_json(service: &str, request: RequestBuilder) -> Result<Value, AdapterError> {
    let response = send(service, request).await?;
    response.json().await.map_err(|e| AdapterError::Malformed {
        service: service.to_string(),
        message: e.to_string(),
    })
}

/// Sends a request, mapping transport failures and non-2xx statuses.
pub async fn send(
    service: &str,
    request: RequestBuilder,
) -> Result<reqwest::Response, AdapterError> {
    let response = request.send().await.map_err(|e| AdapterError::Transport {
        service: service.to_string(),
        message: e.without_url().to_string(),
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let mut body = response.text().await.unwrap_or_default();
        truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
        return Err(AdapterError::Status {
            service: service.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
