pub mod blob;
pub mod filesystem;

use std::sync::Arc;

use reqwest::Client;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::ConfigError;
use crate::secrets::resolve_secret_optional;

use super::DocumentStore;

pub use blob::BlobStore;
pub use filesystem::FilesystemStore;

/// Builds the configured storage backend.
pub fn from_config(
    config: &StorageConfig,
    client: Client,
) -> Result<Arc<dyn DocumentStore>, ConfigError> {
    match config.backend {
        StorageBackend::Filesystem => Ok(Arc::new(FilesystemStore::new(&config.root_dir))),
        StorageBackend::Blob => {
            let container_url = resolve_secret_optional(
                config.container_url.as_deref(),
                config.container_url_file.as_deref(),
                Some(config.container_url_env()),
            )
            .map_err(|e| ConfigError::Secret {
                name: "storage.container_url".to_string(),
                reason: e.to_string(),
            })?;
            Ok(Arc::new(BlobStore::new(client, container_url)))
        }
    }
}
