use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobStoreError;

use super::status::JobStatus;

/// Metadata key holding the storage handle once persistence succeeds.
pub const META_BLOB_URL: &str = "blob_url";
/// Metadata key holding the raw language code once detection finds one.
pub const META_DETECTED_LANGUAGE_CODE: &str = "detected_language_code";

/// Generates a fresh job identifier (32 lowercase hex characters).
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Everything the pipeline produced for a successful job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Fetchable handle of the persisted document.
    pub blob_url: String,
    pub extracted_text: String,
    /// Language name (e.g. "English"), the raw code if it has no name, or "unknown".
    pub detected_lang: String,
    pub translated_text: String,
    pub sentiment: Option<serde_json::Value>,
    pub key_phrases: Option<serde_json::Value>,
}

/// A tracked unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub filename: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Creates a queued job.
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            filename: filename.into(),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            completed_at: None,
            metadata: BTreeMap::new(),
            result: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves to the next in-progress status.
    ///
    /// Terminal statuses have dedicated entry points: use [`Job::complete`]
    /// and [`Job::fail`].
    pub fn advance_to(&mut self, status: JobStatus) -> Result<(), JobStoreError> {
        self.ensure_open()?;
        if status.is_terminal() || !self.status.can_transition_to(status) {
            return Err(JobStoreError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets a metadata entry. Each key can be written once.
    pub fn insert_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), JobStoreError> {
        self.ensure_open()?;
        let key = key.into();
        if self.metadata.contains_key(&key) {
            return Err(JobStoreError::MetadataKeyExists(key));
        }
        self.metadata.insert(key, value.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Enters `done` with the final result. Only legal from the last stage.
    pub fn complete(&mut self, result: JobResult) -> Result<(), JobStoreError> {
        self.ensure_open()?;
        if !self.status.can_transition_to(JobStatus::Done) {
            return Err(JobStoreError::InvalidTransition {
                from: self.status,
                to: JobStatus::Done,
            });
        }
        let now = Utc::now();
        self.status = JobStatus::Done;
        self.result = Some(result);
        self.updated_at = now;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Enters `error` with a human-readable cause.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobStoreError> {
        self.ensure_open()?;
        let now = Utc::now();
        self.status = JobStatus::Error;
        self.error = Some(error.into());
        self.updated_at = now;
        self.completed_at = Some(now);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), JobStoreError> {
        if self.is_finished() {
            return Err(JobStoreError::Terminal(self.id.clone()));
        }
        Ok(())
    }
}
