// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event emission for job-set lifecycle streams.
//!
//! Emission is best-effort after the state mutation: a failed append
//! surfaces to the caller but never rolls the mutation back. The event
//! store is expected to make appends idempotent on its side.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

use flotilla_core::{Clock, Job, JobSetEvent};

/// Failure appending to the event log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event append failed: {0}")]
pub struct EventStoreError(pub String);

/// Append-only event log, sharded by job set.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Ordered append to one job set's stream.
    async fn append(
        &self,
        queue: &str,
        job_set_id: &str,
        events: Vec<JobSetEvent>,
    ) -> Result<(), EventStoreError>;
}

/// Formats lifecycle events and appends them per job set.
#[derive(Clone)]
pub struct EventReporter {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl EventReporter {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn submitted(&self, principal: &str, jobs: &[Job]) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Submitted {
                    job: Box::new(job.clone()),
                    principal: principal.to_string(),
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn queued(&self, principal: &str, jobs: &[Job]) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Queued {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    created,
                })
                .collect(),
        )
        .await
    }

    /// `principal` is empty for system-origin failures.
    pub async fn failed(
        &self,
        principal: &str,
        failures: &[(Job, String)],
    ) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            failures
                .iter()
                .map(|(job, reason)| JobSetEvent::Failed {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    reason: reason.clone(),
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn duplicate_found(
        &self,
        principal: &str,
        jobs: &[Job],
    ) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::DuplicateFound {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn cancelling(
        &self,
        principal: &str,
        jobs: &[Job],
        reason: &str,
    ) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Cancelling {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    reason: reason.to_string(),
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn cancelled(
        &self,
        principal: &str,
        jobs: &[Job],
        reason: &str,
    ) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Cancelled {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    reason: reason.to_string(),
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn reprioritizing(
        &self,
        principal: &str,
        jobs: &[Job],
        new_priority: f64,
    ) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Reprioritizing {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    new_priority,
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn reprioritized(
        &self,
        principal: &str,
        jobs: &[Job],
        new_priority: f64,
    ) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Reprioritized {
                    job_id: job.id,
                    queue: job.queue.clone(),
                    job_set_id: job.job_set_id.clone(),
                    principal: principal.to_string(),
                    new_priority,
                    created,
                })
                .collect(),
        )
        .await
    }

    pub async fn updated(&self, principal: &str, jobs: &[Job]) -> Result<(), EventStoreError> {
        let created = self.clock.utc_now();
        self.append_grouped(
            jobs.iter()
                .map(|job| JobSetEvent::Updated {
                    job: Box::new(job.clone()),
                    principal: principal.to_string(),
                    created,
                })
                .collect(),
        )
        .await
    }

    /// Append events in order, batched per `(queue, job set)` stream.
    async fn append_grouped(&self, events: Vec<JobSetEvent>) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }
        let mut groups: IndexMap<(String, String), Vec<JobSetEvent>> = IndexMap::new();
        for event in events {
            let key = (event.queue().to_string(), event.job_set_id().to_string());
            groups.entry(key).or_default().push(event);
        }
        for ((queue, job_set_id), batch) in groups {
            self.store.append(&queue, &job_set_id, batch).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
