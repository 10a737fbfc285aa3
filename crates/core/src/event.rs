// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-set lifecycle events.
//!
//! Events are appended to a per-job-set stream in the event store.
//! Serializes with `{"type": "job:kind", ...fields}` format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::JobId;
use crate::job::Job;

/// One lifecycle event for a job within its job set.
///
/// `principal` is the acting caller's name, empty for system-origin
/// failures (e.g. a failed repository write).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobSetEvent {
    /// Job accepted by the intake pipeline, about to be persisted.
    #[serde(rename = "job:submitted")]
    Submitted { job: Box<Job>, principal: String, created: DateTime<Utc> },

    /// Job persisted and visible to the scheduler.
    #[serde(rename = "job:queued")]
    Queued {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        created: DateTime<Utc>,
    },

    /// Job could not be persisted or otherwise failed at intake.
    #[serde(rename = "job:failed")]
    Failed {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        reason: String,
        created: DateTime<Utc>,
    },

    /// Repository detected a duplicate submission for `(queue, client_id)`.
    #[serde(rename = "job:duplicate-found")]
    DuplicateFound {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        created: DateTime<Utc>,
    },

    #[serde(rename = "job:cancelling")]
    Cancelling {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        reason: String,
        created: DateTime<Utc>,
    },

    #[serde(rename = "job:cancelled")]
    Cancelled {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        reason: String,
        created: DateTime<Utc>,
    },

    #[serde(rename = "job:reprioritizing")]
    Reprioritizing {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        new_priority: f64,
        created: DateTime<Utc>,
    },

    #[serde(rename = "job:reprioritized")]
    Reprioritized {
        job_id: JobId,
        queue: String,
        job_set_id: String,
        principal: String,
        new_priority: f64,
        created: DateTime<Utc>,
    },

    /// Job record replaced in the store (currently priority changes only).
    #[serde(rename = "job:updated")]
    Updated { job: Box<Job>, principal: String, created: DateTime<Utc> },
}

crate::simple_display! {
    JobSetEvent {
        Submitted { .. } => "submitted",
        Queued { .. } => "queued",
        Failed { .. } => "failed",
        DuplicateFound { .. } => "duplicate-found",
        Cancelling { .. } => "cancelling",
        Cancelled { .. } => "cancelled",
        Reprioritizing { .. } => "reprioritizing",
        Reprioritized { .. } => "reprioritized",
        Updated { .. } => "updated",
    }
}

impl JobSetEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobSetEvent::Submitted { job, .. } | JobSetEvent::Updated { job, .. } => job.id,
            JobSetEvent::Queued { job_id, .. }
            | JobSetEvent::Failed { job_id, .. }
            | JobSetEvent::DuplicateFound { job_id, .. }
            | JobSetEvent::Cancelling { job_id, .. }
            | JobSetEvent::Cancelled { job_id, .. }
            | JobSetEvent::Reprioritizing { job_id, .. }
            | JobSetEvent::Reprioritized { job_id, .. } => *job_id,
        }
    }

    pub fn queue(&self) -> &str {
        match self {
            JobSetEvent::Submitted { job, .. } | JobSetEvent::Updated { job, .. } => &job.queue,
            JobSetEvent::Queued { queue, .. }
            | JobSetEvent::Failed { queue, .. }
            | JobSetEvent::DuplicateFound { queue, .. }
            | JobSetEvent::Cancelling { queue, .. }
            | JobSetEvent::Cancelled { queue, .. }
            | JobSetEvent::Reprioritizing { queue, .. }
            | JobSetEvent::Reprioritized { queue, .. } => queue,
        }
    }

    pub fn job_set_id(&self) -> &str {
        match self {
            JobSetEvent::Submitted { job, .. } | JobSetEvent::Updated { job, .. } => {
                &job.job_set_id
            }
            JobSetEvent::Queued { job_set_id, .. }
            | JobSetEvent::Failed { job_set_id, .. }
            | JobSetEvent::DuplicateFound { job_set_id, .. }
            | JobSetEvent::Cancelling { job_set_id, .. }
            | JobSetEvent::Cancelled { job_set_id, .. }
            | JobSetEvent::Reprioritizing { job_set_id, .. }
            | JobSetEvent::Reprioritized { job_set_id, .. } => job_set_id,
        }
    }

    pub fn principal(&self) -> &str {
        match self {
            JobSetEvent::Submitted { principal, .. }
            | JobSetEvent::Queued { principal, .. }
            | JobSetEvent::Failed { principal, .. }
            | JobSetEvent::DuplicateFound { principal, .. }
            | JobSetEvent::Cancelling { principal, .. }
            | JobSetEvent::Cancelled { principal, .. }
            | JobSetEvent::Reprioritizing { principal, .. }
            | JobSetEvent::Reprioritized { principal, .. }
            | JobSetEvent::Updated { principal, .. } => principal,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
