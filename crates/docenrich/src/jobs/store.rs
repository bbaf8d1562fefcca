//! In-memory job store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::JobStoreError;

use super::record::Job;
use super::status::JobStatus;

/// Process-wide, volatile job store.
///
/// Uses a single `std::sync::RwLock` around the map. Every mutation runs under
/// the write lock, so mutations of one job are totally ordered and readers
/// never observe a half-applied update. The lock is never held across an
/// `.await`.
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    /// Creates an empty job store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Inserts a new job. Fails if the id is already present.
    pub fn create(&self, job: Job) -> Result<Job, JobStoreError> {
        let mut jobs = self.write();
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    /// Returns a snapshot of a job.
    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.read().get(job_id).cloned()
    }

    /// Applies `mutator` to a job under the write lock.
    ///
    /// The mutator works on a copy which replaces the stored record only when
    /// it returns `Ok`, so a rejected mutation leaves the job untouched.
    pub fn update<F, T>(&self, job_id: &str, mutator: F) -> Result<T, JobStoreError>
    where
        F: FnOnce(&mut Job) -> Result<T, JobStoreError>,
    {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))?;

        let mut draft = job.clone();
        let value = mutator(&mut draft)?;
        *job = draft;
        Ok(value)
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the count of jobs as (in progress, done, error).
    pub fn counts(&self) -> (usize, usize, usize) {
        let jobs = self.read();
        let mut in_progress = 0;
        let mut done = 0;
        let mut failed = 0;

        for job in jobs.values() {
            match job.status {
                JobStatus::Done => done += 1,
                JobStatus::Error => failed += 1,
                _ => in_progress += 1,
            }
        }

        (in_progress, done, failed)
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
