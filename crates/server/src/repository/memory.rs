// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory collaborator implementations.
//!
//! Reference backends for tests and local experiments. Each store exposes
//! small knobs for failure injection (backend outages, per-job errors,
//! forced optimistic-write conflicts) so failure paths stay testable.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;

use flotilla_core::{Job, JobId, JobSetEvent, JobSetFilter, JobState, Queue};

use crate::events::{EventStore, EventStoreError};
use crate::scheduling::ClusterSchedulingProfile;

use super::{
    BackendError, JobMutator, JobRepository, QueueRepository, QueueRepositoryError,
    SchedulingInfoRepository, SubmissionResult,
};

/// Queue catalog held in insertion order.
#[derive(Default)]
pub struct InMemoryQueueRepository {
    queues: Mutex<IndexMap<String, Queue>>,
    outage: Mutex<Option<String>>,
}

impl InMemoryQueueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_outage(&self, message: impl Into<String>) {
        *self.outage.lock() = Some(message.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queues.lock().contains_key(name)
    }

    pub fn insert(&self, queue: Queue) {
        self.queues.lock().insert(queue.name.clone(), queue);
    }

    /// Synchronous read for test assertions.
    pub fn stored(&self, name: &str) -> Option<Queue> {
        self.queues.lock().get(name).cloned()
    }

    fn check_outage(&self) -> Result<(), QueueRepositoryError> {
        match self.outage.lock().clone() {
            Some(message) => Err(BackendError(message).into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QueueRepository for InMemoryQueueRepository {
    async fn get(&self, name: &str) -> Result<Queue, QueueRepositoryError> {
        self.check_outage()?;
        self.queues
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| QueueRepositoryError::NotFound(name.to_string()))
    }

    async fn create(&self, queue: Queue) -> Result<(), QueueRepositoryError> {
        self.check_outage()?;
        let mut queues = self.queues.lock();
        if queues.contains_key(&queue.name) {
            return Err(QueueRepositoryError::AlreadyExists(queue.name));
        }
        queues.insert(queue.name.clone(), queue);
        Ok(())
    }

    async fn update(&self, queue: Queue) -> Result<(), QueueRepositoryError> {
        self.check_outage()?;
        let mut queues = self.queues.lock();
        if !queues.contains_key(&queue.name) {
            return Err(QueueRepositoryError::NotFound(queue.name));
        }
        queues.insert(queue.name.clone(), queue);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), QueueRepositoryError> {
        self.check_outage()?;
        match self.queues.lock().shift_remove(name) {
            Some(_) => Ok(()),
            None => Err(QueueRepositoryError::NotFound(name.to_string())),
        }
    }

    async fn get_all(&self) -> Result<Vec<Queue>, QueueRepositoryError> {
        self.check_outage()?;
        Ok(self.queues.lock().values().cloned().collect())
    }
}

/// Job store with repository-owned `(queue, client_id)` deduplication.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<IndexMap<JobId, (Job, JobState)>>,
    dedup: Mutex<HashMap<(String, String), JobId>>,
    outage: Mutex<Option<String>>,
    add_errors: Mutex<HashMap<String, String>>,
    delete_errors: Mutex<HashMap<JobId, String>>,
    update_errors: Mutex<HashMap<JobId, String>>,
    update_conflicts: AtomicUsize,
    delete_hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outage(&self, message: impl Into<String>) {
        *self.outage.lock() = Some(message.into());
    }

    /// Seed a job directly, bypassing dedup.
    pub fn insert(&self, job: Job, state: JobState) {
        self.jobs.lock().insert(job.id, (job, state));
    }

    pub fn set_state(&self, id: JobId, state: JobState) {
        if let Some(entry) = self.jobs.lock().get_mut(&id) {
            entry.1 = state;
        }
    }

    pub fn job(&self, id: JobId) -> Option<Job> {
        self.jobs.lock().get(&id).map(|(job, _)| job.clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Fail the insert of any job carrying this client id.
    pub fn fail_add_client(&self, client_id: impl Into<String>, error: impl Into<String>) {
        self.add_errors.lock().insert(client_id.into(), error.into());
    }

    /// Fail the delete of one job with the given error.
    pub fn fail_delete(&self, id: JobId, error: impl Into<String>) {
        self.delete_errors.lock().insert(id, error.into());
    }

    /// Fail the optimistic update of one job with the given error.
    pub fn fail_update(&self, id: JobId, error: impl Into<String>) {
        self.update_errors.lock().insert(id, error.into());
    }

    /// Force the next `update_jobs` to re-run its mutator `extra` times,
    /// as a version conflict would.
    pub fn force_update_conflicts(&self, extra: usize) {
        self.update_conflicts.store(extra, Ordering::SeqCst);
    }

    /// Run a hook after every `delete_jobs` call (e.g. advancing a fake
    /// clock to exercise the soft deadline).
    pub fn set_delete_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.delete_hook.lock() = Some(Box::new(hook));
    }

    fn check_outage(&self) -> Result<(), BackendError> {
        match self.outage.lock().clone() {
            Some(message) => Err(BackendError(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn add_jobs(&self, jobs: Vec<Job>) -> Result<Vec<SubmissionResult>, BackendError> {
        self.check_outage()?;
        let add_errors = self.add_errors.lock().clone();
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            if let Some(error) =
                job.client_id.as_ref().and_then(|client_id| add_errors.get(client_id))
            {
                results.push(SubmissionResult::failed(job.id, error.clone()));
                continue;
            }
            if let Some(client_id) = &job.client_id {
                let key = (job.queue.clone(), client_id.clone());
                let mut dedup = self.dedup.lock();
                if let Some(original) = dedup.get(&key) {
                    results.push(SubmissionResult::duplicate(*original));
                    continue;
                }
                dedup.insert(key, job.id);
            }
            results.push(SubmissionResult::created(job.id));
            self.jobs.lock().insert(job.id, (job, JobState::Queued));
        }
        Ok(results)
    }

    async fn delete_jobs(
        &self,
        jobs: &[Job],
    ) -> Result<HashMap<JobId, Option<String>>, BackendError> {
        self.check_outage()?;
        let delete_errors = self.delete_errors.lock().clone();
        let mut outcome = HashMap::with_capacity(jobs.len());
        for job in jobs {
            if let Some(error) = delete_errors.get(&job.id) {
                outcome.insert(job.id, Some(error.clone()));
                continue;
            }
            self.jobs.lock().shift_remove(&job.id);
            outcome.insert(job.id, None);
        }
        if let Some(hook) = &*self.delete_hook.lock() {
            hook();
        }
        Ok(outcome)
    }

    async fn get_existing_jobs_by_ids(&self, ids: &[JobId]) -> Result<Vec<Job>, BackendError> {
        self.check_outage()?;
        let jobs = self.jobs.lock();
        Ok(ids.iter().filter_map(|id| jobs.get(id).map(|(job, _)| job.clone())).collect())
    }

    async fn get_job_set_job_ids(
        &self,
        queue: &str,
        job_set_id: &str,
        filter: &JobSetFilter,
    ) -> Result<Vec<JobId>, BackendError> {
        self.check_outage()?;
        let jobs = self.jobs.lock();
        Ok(jobs
            .values()
            .filter(|(job, state)| {
                job.queue == queue && job.job_set_id == job_set_id && filter.includes(*state)
            })
            .map(|(job, _)| job.id)
            .collect())
    }

    async fn get_active_job_ids(
        &self,
        queue: &str,
        job_set_id: &str,
    ) -> Result<Vec<JobId>, BackendError> {
        self.get_job_set_job_ids(queue, job_set_id, &JobSetFilter::all()).await
    }

    async fn get_queue_active_job_sets(&self, queue: &str) -> Result<Vec<String>, BackendError> {
        self.check_outage()?;
        let jobs = self.jobs.lock();
        let mut seen = HashSet::new();
        let mut job_sets = Vec::new();
        for (job, _) in jobs.values() {
            if job.queue == queue && seen.insert(job.job_set_id.clone()) {
                job_sets.push(job.job_set_id.clone());
            }
        }
        Ok(job_sets)
    }

    async fn get_queue_sizes(&self, queues: &[String]) -> Result<Vec<usize>, BackendError> {
        self.check_outage()?;
        let jobs = self.jobs.lock();
        Ok(queues
            .iter()
            .map(|queue| {
                jobs.values()
                    .filter(|(job, state)| job.queue == *queue && *state == JobState::Queued)
                    .count()
            })
            .collect())
    }

    async fn update_jobs(
        &self,
        ids: &[JobId],
        mutator: JobMutator<'_>,
    ) -> Result<Vec<(JobId, String)>, BackendError> {
        self.check_outage()?;
        let runs = 1 + self.update_conflicts.swap(0, Ordering::SeqCst);
        let update_errors = self.update_errors.lock().clone();
        let mut results = Vec::new();
        for run in 0..runs {
            let mut batch: Vec<Job> = {
                let jobs = self.jobs.lock();
                ids.iter().filter_map(|id| jobs.get(id).map(|(job, _)| job.clone())).collect()
            };
            let side_effects = mutator(&mut batch);
            side_effects.await;

            let found: HashSet<JobId> = batch.iter().map(|job| job.id).collect();
            let mut run_results = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(error) = update_errors.get(id) {
                    run_results.push((*id, error.clone()));
                    continue;
                }
                if !found.contains(id) {
                    run_results.push((*id, "job not found".to_string()));
                    continue;
                }
                run_results.push((*id, String::new()));
            }
            if run + 1 == runs {
                let mut jobs = self.jobs.lock();
                for job in batch {
                    if update_errors.contains_key(&job.id) {
                        continue;
                    }
                    if let Some(entry) = jobs.get_mut(&job.id) {
                        entry.0 = job;
                    }
                }
            }
            results = run_results;
        }
        Ok(results)
    }
}

/// Append-only per-job-set event log.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<(String, String, JobSetEvent)>>,
    outage: Mutex<Option<String>>,
    fail_after: Mutex<Option<usize>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outage(&self, message: impl Into<String>) {
        *self.outage.lock() = Some(message.into());
    }

    pub fn clear_outage(&self) {
        *self.outage.lock() = None;
    }

    /// Let the next `appends` calls succeed, then fail the rest.
    pub fn fail_after(&self, appends: usize) {
        *self.fail_after.lock() = Some(appends);
    }

    /// Every recorded event, in append order.
    pub fn events(&self) -> Vec<JobSetEvent> {
        self.events.lock().iter().map(|(_, _, event)| event.clone()).collect()
    }

    /// Events for one job set, in append order.
    pub fn events_for(&self, queue: &str, job_set_id: &str) -> Vec<JobSetEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(q, js, _)| q == queue && js == job_set_id)
            .map(|(_, _, event)| event.clone())
            .collect()
    }

    /// Display names of all events, in append order.
    pub fn kinds(&self) -> Vec<String> {
        self.events.lock().iter().map(|(_, _, event)| event.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        queue: &str,
        job_set_id: &str,
        events: Vec<JobSetEvent>,
    ) -> Result<(), EventStoreError> {
        if let Some(message) = self.outage.lock().clone() {
            return Err(EventStoreError(message));
        }
        {
            let mut fail_after = self.fail_after.lock();
            if let Some(remaining) = fail_after.as_mut() {
                if *remaining == 0 {
                    return Err(EventStoreError("event log down".to_string()));
                }
                *remaining -= 1;
            }
        }
        let mut log = self.events.lock();
        for event in events {
            log.push((queue.to_string(), job_set_id.to_string(), event));
        }
        Ok(())
    }
}

/// Oracle returning a fixed set of cluster profiles.
#[derive(Default)]
pub struct StaticSchedulingInfo {
    profiles: Mutex<Vec<ClusterSchedulingProfile>>,
    outage: Mutex<Option<String>>,
}

impl StaticSchedulingInfo {
    pub fn new(profiles: Vec<ClusterSchedulingProfile>) -> Self {
        Self { profiles: Mutex::new(profiles), outage: Mutex::new(None) }
    }

    pub fn set_outage(&self, message: impl Into<String>) {
        *self.outage.lock() = Some(message.into());
    }
}

#[async_trait]
impl SchedulingInfoRepository for StaticSchedulingInfo {
    async fn get_cluster_scheduling_info(
        &self,
    ) -> Result<Vec<ClusterSchedulingProfile>, BackendError> {
        if let Some(message) = self.outage.lock().clone() {
            return Err(BackendError(message));
        }
        Ok(self.profiles.lock().clone())
    }
}
