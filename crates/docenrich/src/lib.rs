pub mod adapters;
pub mod config;
pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod supervisor;

pub use adapters::{
    Adapters, DocumentHandle, DocumentStore, LanguageDetector, TextAnalyzer, TextExtractor,
    Translator,
};
pub use config::{load_config, load_config_or_default, Config};
pub use error::{
    AdapterError, ConfigError, DocEnrichError, JobStoreError, QueryError, Result, SubmitError,
};
pub use jobs::{
    Job, JobProgressBroadcaster, JobProgressEvent, JobResult, JobStatus, JobStore, ResultView,
    StatusSnapshot,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext, PipelineError};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use supervisor::{JobSupervisor, CANCELLED_ERROR};
