pub mod config;
pub mod context;
pub mod error;
pub mod languages;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use context::{AnalysisInput, PipelineContext};
pub use error::PipelineError;
pub use languages::{display_name, language_name, UNKNOWN_LANGUAGE};
pub use progress::{ProgressEvent, ProgressReporter, StoreProgress};
pub use runner::Pipeline;
