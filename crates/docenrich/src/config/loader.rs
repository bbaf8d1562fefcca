use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::schema::{Config, StorageBackend};
use crate::error::ConfigError;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "DOCENRICH_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    // An empty document deserializes to unit, not to an empty map
    let config: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(content)?
    };

    validate_config(&config)?;

    Ok(config)
}

/// Loads the file at `path`, or the built-in defaults when no path is given.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

/// Config file path taken from `DOCENRICH_CONFIG`, if set.
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// BCP-47 style tags as accepted by the translator: "es", "zh-Hans", "sr-Cyrl".
fn language_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("static regex"))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.bind.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            message: format!("Invalid bind address: {}", config.server.bind),
        });
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "server.max_upload_bytes must be greater than zero".to_string(),
        });
    }

    if !language_tag().is_match(&config.pipeline.target_language) {
        return Err(ConfigError::Validation {
            message: format!(
                "Invalid target language: '{}'",
                config.pipeline.target_language
            ),
        });
    }

    if config.pipeline.stage_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "pipeline.stage_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.storage.backend == StorageBackend::Filesystem
        && config.storage.root_dir.as_os_str().is_empty()
    {
        return Err(ConfigError::Validation {
            message: "storage.root_dir is required for the filesystem backend".to_string(),
        });
    }

    Ok(())
}
