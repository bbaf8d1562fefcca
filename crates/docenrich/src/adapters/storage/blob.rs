use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::adapters::http::send;
use crate::adapters::{DocumentHandle, DocumentStore};
use crate::error::AdapterError;

const SERVICE: &str = "storage service";

/// Stores documents as block blobs in a container addressed by a SAS URL.
///
/// The SAS token must grant create and write on the container. The returned
/// handle reuses the same token so downstream services can read the blob.
pub struct BlobStore {
    client: Client,
    container_url: Option<SecretString>,
}

impl BlobStore {
    pub fn new(client: Client, container_url: Option<SecretString>) -> Self {
        Self {
            client,
            container_url,
        }
    }
}

#[async_trait]
impl DocumentStore for BlobStore {
    async fn store(&self, bytes: &[u8], name: &str) -> Result<DocumentHandle, AdapterError> {
        let container_url = self
            .container_url
            .as_ref()
            .ok_or_else(|| AdapterError::Unavailable(SERVICE.to_string()))?;

        let blob_url = blob_url(
            container_url.expose_secret(),
            &blob_name(name, Utc::now(), &uuid::Uuid::new_v4()),
        );
        let content_type = mime_guess::from_path(name).first_or_octet_stream();

        let request = self
            .client
            .put(&blob_url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type.essence_str())
            .body(bytes.to_vec());

        send(SERVICE, request).await?;
        Ok(DocumentHandle::new(blob_url))
    }
}

/// `YYYYMMDD/<uuid hex>_<name>`; unique even for identical names.
pub fn blob_name(name: &str, now: DateTime<Utc>, id: &uuid::Uuid) -> String {
    format!("{}/{}_{}", now.format("%Y%m%d"), id.simple(), name)
}

/// Inserts `blob_name` into the container URL, ahead of its SAS query.
pub fn blob_url(container_url: &str, blob_name: &str) -> String {
    match container_url.split_once('?') {
        Some((base, query)) => format!("{}/{}?{}", base.trim_end_matches('/'), blob_name, query),
        None => format!("{}/{}", container_url.trim_end_matches('/'), blob_name),
    }
}
