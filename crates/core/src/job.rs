// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records, lifecycle states, and job-set filters.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::PodSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::JobId;

/// Namespace applied when a submission item leaves it blank.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Lifecycle states a job moves through after intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Persisted, waiting for a lease.
    Queued,
    /// Leased to a cluster, pod not yet running.
    Pending,
    Running,
    Succeeded,
    Failed,
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Pending => "pending",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// Selects which states a bulk job-set operation touches.
///
/// Derived from the states a client names: `queued` sets `include_queued`,
/// `pending` or `running` set `include_leased`. An absent or empty state
/// list means everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSetFilter {
    pub include_queued: bool,
    pub include_leased: bool,
}

/// Rejected job-set filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("cannot filter a job set by terminal state {0}")]
    TerminalState(JobState),
}

impl JobSetFilter {
    pub fn all() -> Self {
        Self { include_queued: true, include_leased: true }
    }

    pub fn from_states(states: &[JobState]) -> Result<Self, FilterError> {
        if states.is_empty() {
            return Ok(Self::all());
        }
        let mut filter = Self { include_queued: false, include_leased: false };
        for state in states {
            match state {
                JobState::Queued => filter.include_queued = true,
                JobState::Pending | JobState::Running => filter.include_leased = true,
                JobState::Succeeded | JobState::Failed => {
                    return Err(FilterError::TerminalState(*state))
                }
            }
        }
        Ok(filter)
    }

    pub fn includes(&self, state: JobState) -> bool {
        match state {
            JobState::Queued => self.include_queued,
            JobState::Pending | JobState::Running => self.include_leased,
            JobState::Succeeded | JobState::Failed => false,
        }
    }
}

/// Ingress declaration carried on a job for the executor to realize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IngressConfig {
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub tls_enabled: bool,
}

/// In-cluster service declaration carried on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub ports: Vec<u16>,
}

/// A validated, schedulable job record as persisted by the intake pipeline.
///
/// The submission item's single-spec/multi-spec split is normalized here:
/// `pod_specs` is always non-empty, and deprecated required-node-labels have
/// already been merged into each spec's node selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub queue: String,
    pub job_set_id: String,
    /// Client-chosen dedup key, unique per queue when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub namespace: String,
    /// Name of the principal that submitted the job.
    pub owner: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    pub priority: f64,
    /// Scheduler tag routing the job to a non-default scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    pub pod_specs: Vec<PodSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<IngressConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceConfig>,
    /// zstd blob of the owner's group names (JSON list before compression).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compressed_owner_groups: Vec<u8>,
    pub created: DateTime<Utc>,
    /// Seconds the job may sit queued before the orchestrator expires it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_ttl_seconds: Option<u64>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
