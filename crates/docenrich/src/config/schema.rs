use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_VISION_ENDPOINT_ENV: &str = "COG_ENDPOINT";
pub const DEFAULT_VISION_KEY_ENV: &str = "COG_KEY";
pub const DEFAULT_TRANSLATOR_ENDPOINT_ENV: &str = "TRANSLATOR_ENDPOINT";
pub const DEFAULT_TRANSLATOR_KEY_ENV: &str = "TRANSLATOR_KEY";
pub const DEFAULT_TRANSLATOR_REGION_ENV: &str = "TRANSLATOR_REGION";
pub const DEFAULT_LANGUAGE_ENDPOINT_ENV: &str = "TEXT_ANALYTICS_ENDPOINT";
pub const DEFAULT_LANGUAGE_KEY_ENV: &str = "TEXT_ANALYTICS_KEY";
pub const DEFAULT_CONTAINER_URL_ENV: &str = "AZURE_STORAGE_CONTAINER_URL";
pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub vision: ServiceConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub language: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted upload body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Emit log lines as JSON objects.
    #[serde(default)]
    pub log_json: bool,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            log_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Language every document is translated into.
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Deadline for a single collaborator call.
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_secs: u64,
    /// Upper bound on pipelines running at once. `0` means unbounded.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_stage_timeout() -> u64 {
    60
}

fn default_max_concurrent_jobs() -> usize {
    num_cpus::get()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            stage_timeout_secs: default_stage_timeout(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Blob container addressed by a SAS URL.
    #[default]
    Blob,
    /// Local directory.
    Filesystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Container URL including its SAS query.
    #[serde(default)]
    pub container_url: Option<String>,
    #[serde(default)]
    pub container_url_file: Option<String>,
    #[serde(default)]
    pub container_url_env: Option<String>,
    /// Target directory for the filesystem backend.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

fn default_root_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("docenrich")
        .join("uploads")
}

impl StorageConfig {
    pub fn container_url_env(&self) -> &str {
        self.container_url_env
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_URL_ENV)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            container_url: None,
            container_url_file: None,
            container_url_env: None,
            root_dir: default_root_dir(),
        }
    }
}

/// Endpoint and subscription key of a collaborator service.
///
/// Each value may be given directly or through an environment variable; the
/// key may also come from a file. Unset env var names fall back to the
/// section's conventional names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub endpoint_env: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default)]
    pub key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_env: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.pipeline.target_language, "es");
        assert_eq!(config.pipeline.stage_timeout_secs, 60);
        assert!(config.pipeline.max_concurrent_jobs >= 1);
        assert_eq!(config.storage.backend, StorageBackend::Blob);
        assert!(config.storage.root_dir.ends_with("docenrich/uploads"));
        assert_eq!(config.storage.container_url_env(), "AZURE_STORAGE_CONTAINER_URL");
    }

    #[test]
    fn test_translator_flattens_service_fields() {
        let yaml = r#"
endpoint: https://translator.example
key_env: MY_TRANSLATOR_KEY
region: westeurope
"#;
        let translator: TranslatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            translator.service.endpoint.as_deref(),
            Some("https://translator.example")
        );
        assert_eq!(translator.service.key_env.as_deref(), Some("MY_TRANSLATOR_KEY"));
        assert_eq!(translator.region.as_deref(), Some("westeurope"));
    }
}
