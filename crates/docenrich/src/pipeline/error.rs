use thiserror::Error;

use crate::error::{AdapterError, JobStoreError};
use crate::jobs::JobStatus;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A load-bearing stage failed. The message is the adapter's own.
    #[error("{source}")]
    Stage {
        stage: JobStatus,
        #[source]
        source: AdapterError,
    },

    /// The job record refused a progress update, e.g. because the job was
    /// cancelled while a stage was running.
    #[error("Job update rejected: {0}")]
    Halted(#[from] JobStoreError),
}

impl PipelineError {
    pub fn stage(stage: JobStatus) -> impl FnOnce(AdapterError) -> PipelineError {
        move |source| PipelineError::Stage { stage, source }
    }
}
