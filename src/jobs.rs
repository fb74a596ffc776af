//! Cancellation-safe completion of background extraction jobs.
//!
//! A job moves `Processing -> Completing -> Completed`. A cancel request flips
//! it to `Cancelled` from either of the first two states. Both transitions
//! into and out of `Completing` are compare-and-set, so a cancel that lands
//! before the commit skips it and a cancel that lands during the commit rolls
//! it back.

use crate::error::ExtractError;
use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    Completing,
    Completed,
    Cancelled,
    Failed,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn status(&self, job_id: &str) -> Result<Option<JobStatus>, ExtractError>;

    /// Set `job_id` to `to` only if it is currently `from`. Returns whether
    /// the swap happened.
    async fn compare_and_set(
        &self,
        job_id: &str,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<bool, ExtractError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome<T> {
    Committed(T),
    /// Cancelled before the commit started; nothing was written.
    CancelledBeforeCommit,
    /// Cancelled while committing; the written value was rolled back.
    RolledBack,
}

/// Run `commit` unless the job was cancelled, rolling back if a cancel lands
/// while the commit is in flight.
pub async fn commit_unless_cancelled<T, C, CF, R, RF>(
    store: &dyn JobStore,
    job_id: &str,
    commit: C,
    rollback: R,
) -> Result<CommitOutcome<T>, ExtractError>
where
    C: FnOnce() -> CF,
    CF: Future<Output = Result<T, ExtractError>>,
    R: FnOnce(T) -> RF,
    RF: Future<Output = Result<(), ExtractError>>,
{
    if !store
        .compare_and_set(job_id, JobStatus::Processing, JobStatus::Completing)
        .await?
    {
        info!("Job {} cancelled before commit, skipping", job_id);
        return Ok(CommitOutcome::CancelledBeforeCommit);
    }

    let value = match commit().await {
        Ok(value) => value,
        Err(e) => {
            store
                .compare_and_set(job_id, JobStatus::Completing, JobStatus::Failed)
                .await?;
            return Err(e);
        }
    };

    if store
        .compare_and_set(job_id, JobStatus::Completing, JobStatus::Completed)
        .await?
    {
        return Ok(CommitOutcome::Committed(value));
    }

    warn!("Job {} cancelled during commit, rolling back", job_id);
    rollback(value).await?;
    Ok(CommitOutcome::RolledBack)
}

/// Process-local job store.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, JobStatus>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job_id: &str, status: JobStatus) -> Result<(), ExtractError> {
        self.lock()?.insert(job_id.to_string(), status);
        Ok(())
    }

    /// Request cancellation. Only in-flight jobs can be cancelled.
    pub fn cancel(&self, job_id: &str) -> Result<bool, ExtractError> {
        let mut jobs = self.lock()?;
        match jobs.get_mut(job_id) {
            Some(status) if matches!(*status, JobStatus::Processing | JobStatus::Completing) => {
                *status = JobStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, JobStatus>>, ExtractError> {
        self.jobs
            .lock()
            .map_err(|_| ExtractError::Job("job store lock poisoned".to_string()))
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn status(&self, job_id: &str) -> Result<Option<JobStatus>, ExtractError> {
        Ok(self.lock()?.get(job_id).copied())
    }

    async fn compare_and_set(
        &self,
        job_id: &str,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<bool, ExtractError> {
        let mut jobs = self.lock()?;
        match jobs.get_mut(job_id) {
            Some(status) if *status == from => {
                *status = to;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ExtractError::Job(format!("unknown job {}", job_id))),
        }
    }
}
