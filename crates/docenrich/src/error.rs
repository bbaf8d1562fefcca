use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::jobs::JobStatus;

#[derive(Error, Debug)]
pub enum DocEnrichError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Submission rejected: {0}")]
    Submit(#[from] SubmitError),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Job store error: {0}")]
    JobStore(#[from] JobStoreError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Failed to resolve secret for '{name}': {reason}")]
    Secret { name: String, reason: String },
}

/// Errors returned synchronously from a submission. No job exists afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to register job: {0}")]
    Store(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("job {0} has already finished")]
    AlreadyTerminal(String),
}

/// State-machine and lookup violations raised by the job store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("job already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("job {0} is in a terminal state")]
    Terminal(String),

    #[error("metadata key '{0}' is already set")]
    MetadataKeyExists(String),
}

/// Failures raised by a stage adapter.
///
/// `Unavailable` means the collaborator is not configured at all; every other
/// variant is transport-class (the collaborator was reached, or should have
/// been, and did not produce a usable answer).
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("{0} is not configured")]
    Unavailable(String),

    #[error("request to {service} failed: {message}")]
    Transport { service: String, message: String },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} returned a malformed response: {message}")]
    Malformed { service: String, message: String },

    #[error("{service} did not answer within {after:?}")]
    Timeout { service: String, after: Duration },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AdapterError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AdapterError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, DocEnrichError>;
