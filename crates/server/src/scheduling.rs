// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling configuration: pod-spec defaulting, validation, and the
//! feasibility check against cluster capacity profiles.

use std::collections::HashMap;

use k8s_openapi::api::core::v1::{Container, PodSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use flotilla_core::Job;

/// Capacity profile reported by one cluster: the largest allocatable
/// capacity per resource and the union of node labels jobs may select on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSchedulingProfile {
    pub cluster_id: String,
    #[serde(default)]
    pub allocatable: HashMap<String, Quantity>,
    #[serde(default)]
    pub node_labels: HashMap<String, String>,
}

/// Defaults and limits applied to submitted pod specs before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Resource → quantity filled into requests and limits when a container
    /// names the resource on neither side.
    pub default_container_resources: HashMap<String, Quantity>,

    /// Annotations merged into every job; keys set by the client win.
    pub default_job_annotations: HashMap<String, String>,

    pub default_termination_grace_period_seconds: Option<i64>,

    pub default_active_deadline_seconds: Option<i64>,

    /// Upper bound on the serialized pod spec.
    pub max_pod_spec_size_bytes: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_container_resources: HashMap::new(),
            default_job_annotations: HashMap::new(),
            default_termination_grace_period_seconds: None,
            default_active_deadline_seconds: None,
            max_pod_spec_size_bytes: 65_535,
        }
    }
}

/// Per-item pod-spec validation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PodValidationError {
    #[error("pod spec is {size} bytes, exceeding the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("pod spec has no containers")]
    NoContainers,

    #[error("container {0:?} must set resource requests equal to limits")]
    UnbalancedResources(String),

    #[error("pod spec not serializable: {0}")]
    Unserializable(String),
}

impl SchedulingConfig {
    /// Mirror container requests/limits, fill config defaults, and apply
    /// pod-level defaults in place. Runs before validation.
    pub fn apply_pod_defaults(&self, pod: &mut PodSpec) {
        if pod.termination_grace_period_seconds.is_none() {
            pod.termination_grace_period_seconds = self.default_termination_grace_period_seconds;
        }
        if pod.active_deadline_seconds.is_none() {
            pod.active_deadline_seconds = self.default_active_deadline_seconds;
        }
        for container in &mut pod.containers {
            self.apply_container_defaults(container);
        }
    }

    fn apply_container_defaults(&self, container: &mut Container) {
        let resources = container.resources.get_or_insert_with(Default::default);
        let mut requests = resources.requests.take().unwrap_or_default();
        let mut limits = resources.limits.take().unwrap_or_default();

        // A resource named on one side defaults to the same value on the other.
        for (name, quantity) in &limits {
            if !requests.contains_key(name) {
                requests.insert(name.clone(), quantity.clone());
            }
        }
        for (name, quantity) in &requests {
            if !limits.contains_key(name) {
                limits.insert(name.clone(), quantity.clone());
            }
        }
        for (name, quantity) in &self.default_container_resources {
            if !requests.contains_key(name) {
                requests.insert(name.clone(), quantity.clone());
                limits.insert(name.clone(), quantity.clone());
            }
        }

        resources.requests = Some(requests);
        resources.limits = Some(limits);
    }

    /// Merge configured default annotations under the client's.
    pub fn apply_default_annotations(&self, annotations: &mut HashMap<String, String>) {
        for (key, value) in &self.default_job_annotations {
            annotations.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Validate one pod spec. Runs after [`Self::apply_pod_defaults`].
    pub fn validate_pod_spec(&self, pod: &PodSpec) -> Result<(), PodValidationError> {
        let encoded = serde_json::to_vec(pod)
            .map_err(|e| PodValidationError::Unserializable(e.to_string()))?;
        if encoded.len() > self.max_pod_spec_size_bytes {
            return Err(PodValidationError::TooLarge {
                size: encoded.len(),
                max: self.max_pod_spec_size_bytes,
            });
        }
        if pod.containers.is_empty() {
            return Err(PodValidationError::NoContainers);
        }
        for container in &pod.containers {
            let (requests, limits) = match &container.resources {
                Some(resources) => (resources.requests.as_ref(), resources.limits.as_ref()),
                None => (None, None),
            };
            if requests != limits {
                return Err(PodValidationError::UnbalancedResources(container.name.clone()));
            }
        }
        Ok(())
    }
}

/// Parse a Kubernetes quantity literal ("100m", "4", "2Gi") into a float
/// in base units. Returns `None` for malformed input.
pub fn parse_quantity(text: &str) -> Option<f64> {
    let text = text.trim();
    let split = text.find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'));
    let (number, suffix) = match split {
        Some(idx) => text.split_at(idx),
        None => (text, ""),
    };
    let value: f64 = number.parse().ok()?;
    let scale = match suffix {
        "" => 1.0,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        _ => return None,
    };
    Some(value * scale)
}

/// Sum of per-resource requests across a pod's containers, in base units.
pub fn aggregate_requests(pod: &PodSpec) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for container in &pod.containers {
        let requests = container
            .resources
            .as_ref()
            .and_then(|r| r.requests.as_ref());
        let Some(requests) = requests else { continue };
        for (name, quantity) in requests {
            let amount = parse_quantity(&quantity.0).unwrap_or(0.0);
            *totals.entry(name.clone()).or_insert(0.0) += amount;
        }
    }
    totals
}

fn pod_fits(profile: &ClusterSchedulingProfile, pod: &PodSpec) -> bool {
    if let Some(selector) = &pod.node_selector {
        let selectable = selector
            .iter()
            .all(|(key, value)| profile.node_labels.get(key) == Some(value));
        if !selectable {
            return false;
        }
    }
    aggregate_requests(pod).iter().all(|(resource, requested)| {
        let capacity = profile
            .allocatable
            .get(resource)
            .and_then(|q| parse_quantity(&q.0))
            .unwrap_or(0.0);
        *requested <= capacity
    })
}

/// Whether some cluster can hold every pod of the job.
pub fn job_fits(profiles: &[ClusterSchedulingProfile], job: &Job) -> bool {
    profiles
        .iter()
        .any(|profile| job.pod_specs.iter().all(|pod| pod_fits(profile, pod)))
}

#[cfg(test)]
#[path = "scheduling_tests.rs"]
mod tests;
