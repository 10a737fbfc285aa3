// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job construction: defaulting, per-item validation, and text enrichment.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::PodSpec;
use thiserror::Error;

use flotilla_api::{JobSubmitRequest, JobSubmitRequestItem, JobSubmitResponseItem};
use flotilla_core::{Job, JobId, JobIdGenerator, Principal, DEFAULT_NAMESPACE};

use crate::scheduling::SchedulingConfig;

const JOB_ID_TOKEN: &str = "{JobId}";
const ESCAPED_JOB_ID_TOKEN: &str = "{{JobId}}";

/// Construction failure. Per-item failures carry the minted id for every
/// failed item, in input order.
#[derive(Debug, Error)]
pub(crate) enum CreateJobsError {
    #[error("queue must not be empty")]
    EmptyQueue,

    #[error("job set id must not be empty")]
    EmptyJobSet,

    #[error("{failed} of {total} items failed validation")]
    Items { failed: usize, total: usize, failures: Vec<JobSubmitResponseItem> },
}

/// Substitute the job-id token in labels and annotations.
///
/// The escaped form is handled first: `{{JobId}}` becomes the literal
/// string `JobId`, then `{JobId}` becomes the job's id.
pub(crate) fn enrich_text(text: &str, id: JobId) -> String {
    text.replace(ESCAPED_JOB_ID_TOKEN, "JobId").replace(JOB_ID_TOKEN, &id.to_string())
}

fn enrich_map(map: &mut HashMap<String, String>, id: JobId) {
    for value in map.values_mut() {
        *value = enrich_text(value, id);
    }
}

/// Build validated jobs from a submission request. Ids are minted before
/// validation so failures can still be reported against a stable id.
pub(crate) fn create_jobs(
    config: &SchedulingConfig,
    principal: &Principal,
    compressed_owner_groups: &[u8],
    request: &JobSubmitRequest,
    now: DateTime<Utc>,
) -> Result<Vec<Job>, CreateJobsError> {
    if request.queue.is_empty() {
        return Err(CreateJobsError::EmptyQueue);
    }
    if request.job_set_id.is_empty() {
        return Err(CreateJobsError::EmptyJobSet);
    }

    let mut generator = JobIdGenerator::new();
    let mut jobs = Vec::with_capacity(request.items.len());
    let mut failures = Vec::new();

    for item in &request.items {
        let id = generator.next();
        match build_job(config, principal, compressed_owner_groups, request, item, id, now) {
            Ok(job) => jobs.push(job),
            Err(error) => failures.push(JobSubmitResponseItem { job_id: id, error }),
        }
    }

    if !failures.is_empty() {
        return Err(CreateJobsError::Items {
            failed: failures.len(),
            total: request.items.len(),
            failures,
        });
    }
    Ok(jobs)
}

fn build_job(
    config: &SchedulingConfig,
    principal: &Principal,
    compressed_owner_groups: &[u8],
    request: &JobSubmitRequest,
    item: &JobSubmitRequestItem,
    id: JobId,
    now: DateTime<Utc>,
) -> Result<Job, String> {
    let mut pod_specs: Vec<PodSpec> = match (&item.pod_spec, item.pod_specs.is_empty()) {
        (Some(_), false) => {
            return Err("both podSpec and podSpecs populated; provide exactly one".to_string())
        }
        (Some(spec), true) => vec![spec.clone()],
        (None, false) => item.pod_specs.clone(),
        (None, true) => return Err("no pod spec provided".to_string()),
    };

    let namespace = if item.namespace.is_empty() {
        DEFAULT_NAMESPACE.to_string()
    } else {
        item.namespace.clone()
    };

    let mut annotations = item.annotations.clone();
    config.apply_default_annotations(&mut annotations);
    enrich_map(&mut annotations, id);

    let mut labels = item.labels.clone();
    enrich_map(&mut labels, id);

    for pod in &mut pod_specs {
        if !item.required_node_labels.is_empty() {
            let selector = pod.node_selector.get_or_insert_with(Default::default);
            for (key, value) in &item.required_node_labels {
                selector.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        config.apply_pod_defaults(pod);
        config.validate_pod_spec(pod).map_err(|e| e.to_string())?;
    }

    Ok(Job {
        id,
        queue: request.queue.clone(),
        job_set_id: request.job_set_id.clone(),
        client_id: item.client_id.clone(),
        namespace,
        owner: principal.name.clone(),
        labels,
        annotations,
        priority: item.priority,
        scheduler: item.scheduler.clone(),
        pod_specs,
        ingress: item.ingress.clone(),
        services: item.services.clone(),
        compressed_owner_groups: compressed_owner_groups.to_vec(),
        created: now,
        queue_ttl_seconds: item.queue_ttl_seconds,
    })
}

/// Second pass over the assembled batch: rules that only hold across
/// items. A non-empty client id may appear at most once per batch, or the
/// repository's dedup key would collide within the request itself.
pub(crate) fn check_cross_item_rules(jobs: &[Job]) -> Vec<JobSubmitResponseItem> {
    let mut seen = HashSet::new();
    let mut failures = Vec::new();
    for job in jobs {
        let Some(client_id) = &job.client_id else { continue };
        if !seen.insert(client_id.as_str()) {
            failures.push(JobSubmitResponseItem {
                job_id: job.id,
                error: format!("client id {client_id:?} appears more than once in the request"),
            });
        }
    }
    failures
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
