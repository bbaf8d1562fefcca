use std::sync::Arc;

use crate::error::JobStoreError;
use crate::jobs::{JobProgressBroadcaster, JobProgressEvent, JobResult, JobStatus, JobStore};

/// Events emitted by the pipeline while it runs.
pub enum ProgressEvent {
    /// A stage is about to start.
    Stage { status: JobStatus, message: String },
    /// A stage produced a value worth recording before the job finishes.
    Metadata { key: &'static str, value: String },
    Completed { result: JobResult },
    Failed { error: String },
}

/// Receives pipeline progress.
///
/// An `Err` tells the pipeline to stop: the job can no longer accept updates.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent) -> Result<(), JobStoreError>;
}

/// Writes progress to the job store and mirrors each status change to the
/// broadcast channel.
///
/// The store write happens first, so subscribers never see a status that
/// pollers cannot.
pub struct StoreProgress {
    store: Arc<JobStore>,
    broadcaster: JobProgressBroadcaster,
    job_id: String,
    filename: String,
}

impl StoreProgress {
    pub fn new(
        store: Arc<JobStore>,
        broadcaster: JobProgressBroadcaster,
        job_id: &str,
        filename: &str,
    ) -> Self {
        Self {
            store,
            broadcaster,
            job_id: job_id.to_string(),
            filename: filename.to_string(),
        }
    }
}

impl ProgressReporter for StoreProgress {
    fn report(&self, event: ProgressEvent) -> Result<(), JobStoreError> {
        match event {
            ProgressEvent::Stage { status, message } => {
                self.store
                    .update(&self.job_id, |job| job.advance_to(status))?;
                self.broadcaster.send(JobProgressEvent::new(
                    &self.job_id,
                    &self.filename,
                    status,
                    &message,
                ));
            }
            ProgressEvent::Metadata { key, value } => {
                self.store
                    .update(&self.job_id, |job| job.insert_metadata(key, value))?;
            }
            ProgressEvent::Completed { result } => {
                self.store
                    .update(&self.job_id, |job| job.complete(result))?;
                self.broadcaster.send(JobProgressEvent::new(
                    &self.job_id,
                    &self.filename,
                    JobStatus::Done,
                    "Completed",
                ));
            }
            ProgressEvent::Failed { error } => {
                self.store
                    .update(&self.job_id, |job| job.fail(error.clone()))?;
                self.broadcaster
                    .send(JobProgressEvent::failed(&self.job_id, &self.filename, &error));
            }
        }
        Ok(())
    }
}
