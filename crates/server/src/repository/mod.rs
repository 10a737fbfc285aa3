// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator contracts: the queue catalog, the job store, and the
//! scheduling-info oracle.
//!
//! Backends live outside this workspace; the service only sees these
//! traits. Every method is an I/O boundary that inherits the request
//! deadline and may fail with a backend error.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use thiserror::Error;

use flotilla_core::{Job, JobId, JobSetFilter, Queue};

use crate::scheduling::ClusterSchedulingProfile;

/// Failure talking to an external store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend error: {0}")]
pub struct BackendError(pub String);

/// Typed failures from the queue catalog.
#[derive(Debug, Error)]
pub enum QueueRepositoryError {
    #[error("queue {0:?} not found")]
    NotFound(String),

    #[error("queue {0:?} already exists")]
    AlreadyExists(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Catalog of queue records. Mutations are atomic per queue.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    async fn get(&self, name: &str) -> Result<Queue, QueueRepositoryError>;
    async fn create(&self, queue: Queue) -> Result<(), QueueRepositoryError>;
    async fn update(&self, queue: Queue) -> Result<(), QueueRepositoryError>;
    async fn delete(&self, name: &str) -> Result<(), QueueRepositoryError>;
    /// Every queue, in catalog order.
    async fn get_all(&self) -> Result<Vec<Queue>, QueueRepositoryError>;
}

/// Per-item outcome of a batched job insert.
///
/// Duplicate detection is repository-owned, keyed on `(queue, client_id)`;
/// a duplicate result carries the id of the job found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub job_id: JobId,
    pub error: Option<String>,
    pub duplicate_detected: bool,
}

impl SubmissionResult {
    pub fn created(job_id: JobId) -> Self {
        Self { job_id, error: None, duplicate_detected: false }
    }

    pub fn duplicate(job_id: JobId) -> Self {
        Self { job_id, error: None, duplicate_detected: true }
    }

    pub fn failed(job_id: JobId, error: impl Into<String>) -> Self {
        Self { job_id, error: Some(error.into()), duplicate_detected: false }
    }
}

/// Mutator applied to a batch of jobs inside the store's optimistic retry
/// loop: mutate the slice synchronously, then return a future running any
/// side effects. The store re-reads and re-invokes the mutator on version
/// conflict, so side effects may run more than once.
pub type JobMutator<'a> = &'a (dyn Fn(&mut [Job]) -> BoxFuture<'static, ()> + Send + Sync);

/// The persistent job store.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a batch; one result per input job, in input order.
    async fn add_jobs(&self, jobs: Vec<Job>) -> Result<Vec<SubmissionResult>, BackendError>;

    /// Delete a batch; per-job error, `None` on success.
    async fn delete_jobs(
        &self,
        jobs: &[Job],
    ) -> Result<HashMap<JobId, Option<String>>, BackendError>;

    /// Load the jobs that still exist among `ids`, in the given order.
    async fn get_existing_jobs_by_ids(&self, ids: &[JobId]) -> Result<Vec<Job>, BackendError>;

    /// Ids of a job set's jobs matching the state filter.
    async fn get_job_set_job_ids(
        &self,
        queue: &str,
        job_set_id: &str,
        filter: &JobSetFilter,
    ) -> Result<Vec<JobId>, BackendError>;

    /// Ids of a job set's non-terminal jobs.
    async fn get_active_job_ids(
        &self,
        queue: &str,
        job_set_id: &str,
    ) -> Result<Vec<JobId>, BackendError>;

    /// Job sets with at least one non-terminal job on the queue.
    async fn get_queue_active_job_sets(&self, queue: &str) -> Result<Vec<String>, BackendError>;

    /// Queued-job counts, one per requested queue.
    async fn get_queue_sizes(&self, queues: &[String]) -> Result<Vec<usize>, BackendError>;

    /// Optimistic read-modify-write over `ids` under a version guard.
    /// Returns `(job id, error)` pairs in input order; an empty error string
    /// means success.
    async fn update_jobs(
        &self,
        ids: &[JobId],
        mutator: JobMutator<'_>,
    ) -> Result<Vec<(JobId, String)>, BackendError>;
}

/// Oracle reporting the scheduling capacity of every connected cluster.
#[async_trait]
pub trait SchedulingInfoRepository: Send + Sync {
    async fn get_cluster_scheduling_info(
        &self,
    ) -> Result<Vec<ClusterSchedulingProfile>, BackendError>;
}
