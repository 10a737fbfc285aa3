// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use k8s_openapi::api::core::v1::PodSpec;
use serde::{Deserialize, Serialize};

use flotilla_core::{IngressConfig, JobId, JobState, ServiceConfig};

/// A batch of job submissions for one queue and job set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmitRequest {
    pub queue: String,
    pub job_set_id: String,
    #[serde(default)]
    pub items: Vec<JobSubmitRequestItem>,
}

/// One job in a submission batch.
///
/// Exactly one of `pod_spec` / `pod_specs` must be populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobSubmitRequestItem {
    #[serde(default)]
    pub priority: f64,

    /// Target namespace; defaults to `default` when blank.
    #[serde(default)]
    pub namespace: String,

    /// Client-chosen dedup key, unique per queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub annotations: HashMap<String, String>,

    /// Deprecated; merged into each pod spec's node selector at intake.
    #[serde(default)]
    pub required_node_labels: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_spec: Option<PodSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pod_specs: Vec<PodSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<IngressConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceConfig>,

    /// Routes the job to a non-default scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_ttl_seconds: Option<u64>,
}

/// Cancel one job by id, or a whole job set by queue + job-set id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCancelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,

    #[serde(default)]
    pub queue: String,

    #[serde(default)]
    pub job_set_id: String,

    #[serde(default)]
    pub reason: String,
}

/// Cancel a job set, optionally restricted to a subset of states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSetCancelRequest {
    pub queue: String,
    pub job_set_id: String,

    /// Absent filter means all states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<JobSetFilterSpec>,

    #[serde(default)]
    pub reason: String,
}

/// States a job-set operation should touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobSetFilterSpec {
    #[serde(default)]
    pub states: Vec<JobState>,
}

/// Change the priority of named jobs, or of every active job in a job set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReprioritizeRequest {
    #[serde(default)]
    pub job_ids: Vec<JobId>,

    #[serde(default)]
    pub queue: String,

    #[serde(default)]
    pub job_set_id: String,

    pub new_priority: f64,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
