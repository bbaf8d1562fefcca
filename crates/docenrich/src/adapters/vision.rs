//! OCR through the Computer Vision v3.2 REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::schema::{DEFAULT_VISION_ENDPOINT_ENV, DEFAULT_VISION_KEY_ENV};
use crate::config::ServiceConfig;
use crate::error::{AdapterError, ConfigError};

use super::http::{authorize, resolve_service, send_json, ServiceCredentials};
use super::{DocumentHandle, TextExtractor};

const SERVICE: &str = "text extraction service";
const OCR_PATH: &str = "/vision/v3.2/ocr?language=unk&detectOrientation=true";

pub struct VisionOcrClient {
    client: Client,
    credentials: Option<ServiceCredentials>,
}

impl VisionOcrClient {
    pub fn new(client: Client, credentials: Option<ServiceCredentials>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn from_config(config: &ServiceConfig, client: Client) -> Result<Self, ConfigError> {
        let credentials = resolve_service(
            "vision",
            config,
            DEFAULT_VISION_ENDPOINT_ENV,
            DEFAULT_VISION_KEY_ENV,
            None,
        )?;
        Ok(Self::new(client, credentials))
    }
}

#[async_trait]
impl TextExtractor for VisionOcrClient {
    async fn extract(&self, handle: &DocumentHandle) -> Result<String, AdapterError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AdapterError::Unavailable(SERVICE.to_string()))?;

        let request = authorize(self.client.post(credentials.url(OCR_PATH)), credentials);

        // Local files are not reachable by the service, so their bytes are sent inline
        let request = match handle.local_path() {
            Some(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| AdapterError::Io {
                    path: path.into(),
                    source: e,
                })?;
                request
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes)
            }
            None => request.json(&json!({ "url": handle.as_str() })),
        };

        let response = send_json(SERVICE, request).await?;
        Ok(parse_ocr_response(&response))
    }
}

/// Flattens an OCR response into text.
///
/// Each line becomes its words joined by single spaces; lines are joined by
/// newlines and the result is trimmed. Missing fields count as empty.
pub fn parse_ocr_response(response: &Value) -> String {
    let mut lines = Vec::new();

    let regions = response["regions"].as_array().map(Vec::as_slice).unwrap_or_default();
    for region in regions {
        let region_lines = region["lines"].as_array().map(Vec::as_slice).unwrap_or_default();
        for line in region_lines {
            let words = line["words"].as_array().map(Vec::as_slice).unwrap_or_default();
            let text = words
                .iter()
                .map(|word| word["text"].as_str().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(text);
        }
    }

    lines.join("\n").trim().to_string()
}
