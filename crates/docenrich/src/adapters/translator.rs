//! Translation through the Translator v3 REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::schema::{
    DEFAULT_TRANSLATOR_ENDPOINT, DEFAULT_TRANSLATOR_ENDPOINT_ENV, DEFAULT_TRANSLATOR_KEY_ENV,
    DEFAULT_TRANSLATOR_REGION_ENV,
};
use crate::config::TranslatorConfig;
use crate::error::{AdapterError, ConfigError};
use crate::secrets::resolve_setting;

use super::http::{authorize, resolve_service, send_json, ServiceCredentials};
use super::Translator;

const SERVICE: &str = "translation service";
const REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

pub struct TranslatorClient {
    client: Client,
    credentials: Option<ServiceCredentials>,
    region: Option<String>,
}

impl TranslatorClient {
    pub fn new(
        client: Client,
        credentials: Option<ServiceCredentials>,
        region: Option<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            region,
        }
    }

    pub fn from_config(config: &TranslatorConfig, client: Client) -> Result<Self, ConfigError> {
        let credentials = resolve_service(
            "translator",
            &config.service,
            DEFAULT_TRANSLATOR_ENDPOINT_ENV,
            DEFAULT_TRANSLATOR_KEY_ENV,
            Some(DEFAULT_TRANSLATOR_ENDPOINT),
        )?;
        let region = resolve_setting(
            config.region.as_deref(),
            Some(
                config
                    .region_env
                    .as_deref()
                    .unwrap_or(DEFAULT_TRANSLATOR_REGION_ENV),
            ),
        );
        Ok(Self::new(client, credentials, region))
    }
}

#[async_trait]
impl Translator for TranslatorClient {
    async fn translate(&self, text: &str, to: &str) -> Result<String, AdapterError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AdapterError::Unavailable(SERVICE.to_string()))?;

        let request = self
            .client
            .post(credentials.url("/translate"))
            .query(&[("api-version", "3.0"), ("to", to)])
            .header(REGION_HEADER, self.region.as_deref().unwrap_or_default())
            .json(&json!([{ "Text": text }]));

        let response = send_json(SERVICE, authorize(request, credentials)).await?;
        Ok(parse_translation(&response))
    }
}

/// Reads `[0].translations[0].text`; anything else yields an empty string.
pub fn parse_translation(response: &Value) -> String {
    response[0]["translations"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
