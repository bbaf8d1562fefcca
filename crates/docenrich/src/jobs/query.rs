//! Read-only views over the job store.

use serde::Serialize;

use crate::error::QueryError;

use super::record::JobResult;
use super::status::JobStatus;
use super::store::JobStore;

/// Current status of a job, as returned to polling clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    pub error: Option<String>,
}

/// Answer to a result query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultView {
    /// The job finished successfully.
    Done(JobResult),
    /// The job is still queued or running.
    Pending { status: JobStatus },
    /// The job ended in `error`.
    Failed { status: JobStatus, error: String },
}

pub fn status(store: &JobStore, job_id: &str) -> Result<StatusSnapshot, QueryError> {
    let job = store
        .get(job_id)
        .ok_or_else(|| QueryError::NotFound(job_id.to_string()))?;

    Ok(StatusSnapshot {
        status: job.status,
        error: job.error,
    })
}

pub fn result(store: &JobStore, job_id: &str) -> Result<ResultView, QueryError> {
    let job = store
        .get(job_id)
        .ok_or_else(|| QueryError::NotFound(job_id.to_string()))?;

    let view = match (job.status, job.result, job.error) {
        (JobStatus::Done, Some(result), _) => ResultView::Done(result),
        (JobStatus::Error, _, error) => ResultView::Failed {
            status: JobStatus::Error,
            error: error.unwrap_or_default(),
        },
        (status, _, _) => ResultView::Pending { status },
    };

    Ok(view)
}
