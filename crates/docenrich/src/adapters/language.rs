//! Language detection, sentiment and key phrases through Text Analytics v3.1.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::schema::{DEFAULT_LANGUAGE_ENDPOINT_ENV, DEFAULT_LANGUAGE_KEY_ENV};
use crate::config::ServiceConfig;
use crate::error::{AdapterError, ConfigError};

use super::http::{authorize, resolve_service, send_json, ServiceCredentials};
use super::{LanguageDetector, TextAnalyzer};

const SERVICE: &str = "language service";
const LANGUAGES_PATH: &str = "/text/analytics/v3.1/languages";
const SENTIMENT_PATH: &str = "/text/analytics/v3.1/sentiment";
const KEY_PHRASES_PATH: &str = "/text/analytics/v3.1/keyPhrases";
const DEFAULT_LANGUAGE: &str = "en";

pub struct TextAnalyticsClient {
    client: Client,
    credentials: Option<ServiceCredentials>,
}

impl TextAnalyticsClient {
    pub fn new(client: Client, credentials: Option<ServiceCredentials>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn from_config(config: &ServiceConfig, client: Client) -> Result<Self, ConfigError> {
        let credentials = resolve_service(
            "language",
            config,
            DEFAULT_LANGUAGE_ENDPOINT_ENV,
            DEFAULT_LANGUAGE_KEY_ENV,
            None,
        )?;
        Ok(Self::new(client, credentials))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, AdapterError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AdapterError::Unavailable(SERVICE.to_string()))?;

        let request = authorize(self.client.post(credentials.url(path)), credentials).json(&body);
        send_json(SERVICE, request).await
    }
}

#[async_trait]
impl LanguageDetector for TextAnalyticsClient {
    async fn detect(&self, text: &str) -> Result<Option<String>, AdapterError> {
        let body = json!({ "documents": [{ "id": "1", "text": text }] });
        let response = self.post(LANGUAGES_PATH, body).await?;
        Ok(parse_detected_language(&response))
    }
}

#[async_trait]
impl TextAnalyzer for TextAnalyticsClient {
    async fn sentiment(&self, text: &str, language: Option<&str>) -> Result<Value, AdapterError> {
        self.post(SENTIMENT_PATH, analysis_documents(text, language))
            .await
    }

    async fn key_phrases(
        &self,
        text: &str,
        language: Option<&str>,
    ) -> Result<Value, AdapterError> {
        self.post(KEY_PHRASES_PATH, analysis_documents(text, language))
            .await
    }
}

/// Single-document request body for the analysis endpoints.
pub fn analysis_documents(text: &str, language: Option<&str>) -> Value {
    json!({
        "documents": [{
            "id": "1",
            "language": language.unwrap_or(DEFAULT_LANGUAGE),
            "text": text,
        }]
    })
}

/// Reads `documents[0].detectedLanguage.iso6391Name`.
///
/// The service answers `(Unknown)` when it cannot decide; that and any
/// unexpected shape yield `None`.
pub fn parse_detected_language(response: &Value) -> Option<String> {
    let code = response["documents"][0]["detectedLanguage"]["iso6391Name"].as_str()?;
    let code = code.trim();
    if code.is_empty() || code.starts_with('(') {
        return None;
    }
    Some(code.to_string())
}
