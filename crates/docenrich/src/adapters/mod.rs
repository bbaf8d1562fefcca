//! Stage adapters: one narrow async boundary per collaborator.
//!
//! Adapters know nothing about jobs. Each returns [`AdapterError::Unavailable`]
//! when its collaborator is not configured and a transport-class variant for
//! every other failure; the pipeline decides what each failure means.

pub mod http;
pub mod language;
pub mod storage;
pub mod translator;
pub mod vision;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::{AdapterError, ConfigError};
use crate::sanitize::redact_url;

pub use language::TextAnalyticsClient;
pub use storage::{BlobStore, FilesystemStore};
pub use translator::TranslatorClient;
pub use vision::VisionOcrClient;

/// Fetchable location of a persisted document: an `https://` URL (possibly
/// carrying a SAS query) or a `file://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The handle with any query string masked, for logs and spans.
    pub fn redacted(&self) -> String {
        redact_url(&self.0)
    }

    /// Local path when this is a `file://` handle.
    pub fn local_path(&self) -> Option<&str> {
        self.0.strip_prefix("file://")
    }
}

/// Persists raw document bytes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, bytes: &[u8], name: &str) -> Result<DocumentHandle, AdapterError>;
}

/// Extracts text from a persisted document image. Empty text is a valid result.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, handle: &DocumentHandle) -> Result<String, AdapterError>;
}

/// Detects the language of a text. `None` means no language could be detected.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<Option<String>, AdapterError>;
}

/// Translates text into the language `to`.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, to: &str) -> Result<String, AdapterError>;
}

/// Text analytics. Payloads are passed through opaquely.
///
/// `language` defaults to English when absent.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn sentiment(&self, text: &str, language: Option<&str>) -> Result<Value, AdapterError>;

    async fn key_phrases(&self, text: &str, language: Option<&str>)
        -> Result<Value, AdapterError>;
}

/// The full set of collaborators a pipeline runs against.
#[derive(Clone)]
pub struct Adapters {
    pub store: Arc<dyn DocumentStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub detector: Arc<dyn LanguageDetector>,
    pub translator: Arc<dyn Translator>,
    pub analyzer: Arc<dyn TextAnalyzer>,
}

impl Adapters {
    /// Builds the HTTP-backed adapters described by `config`.
    ///
    /// Missing endpoints or keys do not fail here; the affected adapter
    /// reports itself unavailable when called.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let client = http::create_http_client()?;

        let store = storage::from_config(&config.storage, client.clone())?;
        let extractor = Arc::new(VisionOcrClient::from_config(&config.vision, client.clone())?);
        let translator = Arc::new(TranslatorClient::from_config(
            &config.translator,
            client.clone(),
        )?);
        let analytics = Arc::new(TextAnalyticsClient::from_config(&config.language, client)?);

        Ok(Self {
            store,
            extractor,
            detector: analytics.clone(),
            translator,
            analyzer: analytics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_redaction() {
        let handle = DocumentHandle::new("https://acct.blob/uploads/a.png?sv=1&sig=secret");
        assert_eq!(handle.redacted(), "https://acct.blob/uploads/a.png?****");
        assert!(handle.local_path().is_none());
    }

    #[test]
    fn test_file_handle_local_path() {
        let handle = DocumentHandle::new("file:///var/lib/docenrich/a.png");
        assert_eq!(handle.local_path(), Some("/var/lib/docenrich/a.png"));
    }

    #[tokio::test]
    async fn test_unconfigured_adapters_report_unavailable() {
        let mut config = Config::default();
        for section in [&mut config.vision, &mut config.language, &mut config.translator.service] {
            section.endpoint_env = Some("DOCENRICH_TEST_NEVER_SET_ENDPOINT".to_string());
            section.key_env = Some("DOCENRICH_TEST_NEVER_SET_KEY".to_string());
        }
        config.storage.container_url_env = Some("DOCENRICH_TEST_NEVER_SET_URL".to_string());

        let adapters = Adapters::from_config(&config).unwrap();
        let handle = DocumentHandle::new("https://x/a.png");

        assert!(adapters.store.store(b"data", "a.png").await.unwrap_err().is_unavailable());
        assert!(adapters.extractor.extract(&handle).await.unwrap_err().is_unavailable());
        assert!(adapters.detector.detect("hello").await.unwrap_err().is_unavailable());
        assert!(adapters
            .translator
            .translate("hello", "es")
            .await
            .unwrap_err()
            .is_unavailable());
        assert!(adapters
            .analyzer
            .sentiment("hello", None)
            .await
            .unwrap_err()
            .is_unavailable());
        assert!(adapters
            .analyzer
            .key_phrases("hello", Some("es"))
            .await
            .unwrap_err()
            .is_unavailable());
    }
}
