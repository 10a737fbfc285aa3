// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job intake pipeline.
//!
//! Stages run in a fixed order; the first failing stage short-circuits
//! the request. Event emission is best-effort after persistence and is
//! never rolled back.

mod factory;

use thiserror::Error;
use tracing::{error, info};

use flotilla_api::{JobSubmitRequest, JobSubmitResponse, JobSubmitResponseItem};
use flotilla_core::{
    GlobalPermission, Job, Queue, QueuePermissions, QueueVerb, Subject,
};

use crate::auth::{AuthError, RequestContext};
use crate::compress::CompressError;
use crate::events::EventStoreError;
use crate::repository::{BackendError, QueueRepositoryError};
use crate::scheduling;
use crate::service::ServiceCtx;

use factory::CreateJobsError;

#[derive(Debug, Error)]
pub(crate) enum SubmitError {
    #[error("{message}")]
    Invalid { message: String, items: Vec<JobSubmitResponseItem> },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("queue {0:?} does not exist and queue auto-creation is disabled")]
    QueueMissing(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("event emission failed: {0}")]
    Emission(#[from] EventStoreError),

    #[error("job persistence failed: {0}")]
    PersistFailed(String),

    #[error("jobs persisted but event emission failed: {message}")]
    PostPersistence { message: String, items: Vec<JobSubmitResponseItem> },

    #[error(transparent)]
    Compress(#[from] CompressError),
}

impl SubmitError {
    fn invalid(message: impl Into<String>) -> Self {
        SubmitError::Invalid { message: message.into(), items: Vec::new() }
    }
}

/// Run a submission through the full intake pipeline.
pub(crate) async fn handle_submit_jobs(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    request: JobSubmitRequest,
) -> Result<JobSubmitResponse, SubmitError> {
    // Construction. The compressor is borrowed only for the blob and
    // returned on every path by the guard.
    let compressed_owner_groups = {
        let mut compressor = ctx.compressors.acquire().await?;
        compressor.compress_groups(&rctx.principal.groups)?
    };

    let jobs = match factory::create_jobs(
        &ctx.config.scheduling,
        &rctx.principal,
        &compressed_owner_groups,
        &request,
        ctx.clock.utc_now(),
    ) {
        Ok(jobs) => jobs,
        Err(err @ (CreateJobsError::EmptyQueue | CreateJobsError::EmptyJobSet)) => {
            return Err(SubmitError::invalid(err.to_string()))
        }
        Err(CreateJobsError::Items { failed, total, failures }) => {
            return Err(SubmitError::Invalid {
                message: format!("{failed} of {total} items failed validation"),
                items: failures,
            })
        }
    };

    // Cross-item rules.
    let cross_failures = factory::check_cross_item_rules(&jobs);
    if !cross_failures.is_empty() {
        return Err(SubmitError::Invalid {
            message: format!("{} items failed cross-item validation", cross_failures.len()),
            items: cross_failures,
        });
    }

    // Queue resolution, with optional auto-provisioning.
    let queue = resolve_queue(ctx, rctx, &request.queue).await?;

    // Quota.
    if ctx.config.default_queued_jobs_limit > 0 {
        let sizes = ctx.job_repository.get_queue_sizes(&[queue.name.clone()]).await?;
        let queued = sizes.first().copied().unwrap_or(0);
        let limit = ctx.config.default_queued_jobs_limit as usize;
        if queued + jobs.len() > limit {
            return Err(SubmitError::invalid(format!(
                "queue {} already has {} queued jobs; adding {} would make {}, over the limit of {}",
                queue.name,
                queued,
                jobs.len(),
                queued + jobs.len(),
                limit,
            )));
        }
    }

    // Per-queue authorization.
    ctx.authorizer
        .authorize_queue_action(
            &rctx.principal,
            &queue,
            GlobalPermission::SubmitAnyJobs,
            QueueVerb::Submit,
        )
        .await?;

    // Feasibility: fail fast instead of queueing a job no cluster can hold.
    let profiles = ctx.scheduling_info.get_cluster_scheduling_info().await?;
    let infeasible: Vec<JobSubmitResponseItem> = jobs
        .iter()
        .filter(|job| !scheduling::job_fits(&profiles, job))
        .map(|job| JobSubmitResponseItem {
            job_id: job.id,
            error: "job does not fit on any cluster".to_string(),
        })
        .collect();
    if !infeasible.is_empty() {
        return Err(SubmitError::Invalid {
            message: format!("{} of {} jobs cannot be scheduled on any cluster", infeasible.len(), jobs.len()),
            items: infeasible,
        });
    }

    // Pre-persistence event.
    ctx.reporter.submitted(&rctx.principal.name, &jobs).await?;

    // Persistence.
    let results = match ctx.job_repository.add_jobs(jobs.clone()).await {
        Ok(results) => results,
        Err(err) => {
            let failures: Vec<(Job, String)> =
                jobs.into_iter().map(|job| (job, err.to_string())).collect();
            if let Err(emit_err) = ctx.reporter.failed("", &failures).await {
                error!(error = %emit_err, "failed-event emission after persistence failure");
            }
            return Err(SubmitError::PersistFailed(err.0));
        }
    };
    if results.len() != jobs.len() {
        return Err(SubmitError::PersistFailed(format!(
            "repository returned {} results for {} jobs",
            results.len(),
            jobs.len(),
        )));
    }

    // Post-persistence dispatch.
    let mut response_items = Vec::with_capacity(results.len());
    let mut failed: Vec<(Job, String)> = Vec::new();
    let mut duplicates: Vec<Job> = Vec::new();
    let mut created: Vec<Job> = Vec::new();
    for (job, result) in jobs.into_iter().zip(results) {
        response_items.push(JobSubmitResponseItem {
            job_id: result.job_id,
            error: result.error.clone().unwrap_or_default(),
        });
        match result.error {
            Some(error) => failed.push((job, error)),
            None if result.duplicate_detected => duplicates.push(job),
            None => created.push(job),
        }
    }

    let principal = rctx.principal.name.as_str();
    let mut emission_error: Option<EventStoreError> = None;
    for outcome in [
        ctx.reporter.failed(principal, &failed).await,
        ctx.reporter.duplicate_found(principal, &duplicates).await,
        ctx.reporter.queued(principal, &created).await,
    ] {
        if let Err(err) = outcome {
            error!(error = %err, "post-persistence event emission failed");
            emission_error.get_or_insert(err);
        }
    }

    info!(
        queue = %request.queue,
        job_set = %request.job_set_id,
        created = created.len(),
        duplicates = duplicates.len(),
        failed = failed.len(),
        "submission processed"
    );

    if let Some(err) = emission_error {
        return Err(SubmitError::PostPersistence { message: err.0, items: response_items });
    }
    Ok(JobSubmitResponse { items: response_items })
}

/// Look up the target queue, auto-creating it when allowed.
async fn resolve_queue(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    name: &str,
) -> Result<Queue, SubmitError> {
    match ctx.queue_repository.get(name).await {
        Ok(queue) => Ok(queue),
        Err(QueueRepositoryError::NotFound(_)) => {
            if !ctx.config.auto_create_queues {
                return Err(SubmitError::QueueMissing(name.to_string()));
            }
            ctx.authorizer
                .authorize_action(&rctx.principal, GlobalPermission::SubmitAnyJobs)
                .await?;

            let mut queue = Queue::new(name, ctx.config.default_priority_factor);
            queue
                .permissions
                .push(QueuePermissions::owner(Subject::User(rctx.principal.name.clone())));
            for group in rctx.principal.named_groups() {
                queue.permissions.push(QueuePermissions {
                    subjects: vec![Subject::Group(group.to_string())],
                    verbs: QueueVerb::ALL.to_vec(),
                });
            }
            match ctx.queue_repository.create(queue.clone()).await {
                Ok(()) => {
                    info!(queue = %name, owner = %rctx.principal.name, "auto-created queue");
                    Ok(queue)
                }
                // Lost a create race; the winner's record is authoritative.
                Err(QueueRepositoryError::AlreadyExists(_)) => {
                    ctx.queue_repository.get(name).await.map_err(|err| match err {
                        QueueRepositoryError::Backend(e) => SubmitError::Backend(e),
                        other => SubmitError::Backend(BackendError(other.to_string())),
                    })
                }
                Err(QueueRepositoryError::Backend(err)) => Err(SubmitError::Backend(err)),
                Err(other) => Err(SubmitError::Backend(BackendError(other.to_string()))),
            }
        }
        Err(QueueRepositoryError::Backend(err)) => Err(SubmitError::Backend(err)),
        Err(other) => Err(SubmitError::Backend(BackendError(other.to_string()))),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
