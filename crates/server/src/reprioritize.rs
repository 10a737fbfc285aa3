// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reprioritization engine.
//!
//! The priority write runs under the job store's optimistic-update
//! contract. The mutator emits `Updated` and `Reprioritized` inside the
//! critical section, so a version-conflict retry re-emits them; the event
//! store is expected to absorb duplicates.

use futures_util::future::BoxFuture;
use thiserror::Error;
use tracing::{info, warn};

use flotilla_api::{ReprioritizeRequest, ReprioritizeResponse};
use flotilla_core::{GlobalPermission, Job, QueueVerb};

use crate::auth::{authorize_job_queues, AuthError, QueueAuthFailure, RequestContext};
use crate::events::EventStoreError;
use crate::repository::BackendError;
use crate::service::ServiceCtx;

#[derive(Debug, Error)]
pub(crate) enum ReprioritizeError {
    #[error("{message}")]
    Invalid { message: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("queue {0:?} not found")]
    QueueNotFound(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("event emission failed: {0}")]
    Emission(#[from] EventStoreError),
}

/// Set a new priority on the addressed jobs. Returns one entry per job
/// id; an empty error string means success.
pub(crate) async fn handle_reprioritize_jobs(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    request: ReprioritizeRequest,
) -> Result<ReprioritizeResponse, ReprioritizeError> {
    if !request.new_priority.is_finite() {
        return Err(ReprioritizeError::Invalid {
            message: format!("new priority must be finite, got {}", request.new_priority),
        });
    }

    let ids = if !request.job_ids.is_empty() {
        request.job_ids.clone()
    } else if !request.queue.is_empty() && !request.job_set_id.is_empty() {
        ctx.job_repository.get_active_job_ids(&request.queue, &request.job_set_id).await?
    } else {
        return Err(ReprioritizeError::Invalid {
            message: "specify job ids or a queue and job set id".to_string(),
        });
    };

    let jobs = ctx.job_repository.get_existing_jobs_by_ids(&ids).await?;
    authorize_job_queues(
        ctx.authorizer.as_ref(),
        ctx.queue_repository.as_ref(),
        &rctx.principal,
        &jobs,
        GlobalPermission::ReprioritizeAnyJobs,
        QueueVerb::Reprioritize,
    )
    .await
    .map_err(|failure| match failure {
        QueueAuthFailure::Auth(source) => ReprioritizeError::Auth(source),
        QueueAuthFailure::Repository(crate::repository::QueueRepositoryError::NotFound(q)) => {
            ReprioritizeError::QueueNotFound(q)
        }
        QueueAuthFailure::Repository(other) => {
            ReprioritizeError::Backend(BackendError(other.to_string()))
        }
    })?;

    // Announced outside the critical section; a retry does not repeat it.
    ctx.reporter.reprioritizing(&rctx.principal.name, &jobs, request.new_priority).await?;

    let reporter = ctx.reporter.clone();
    let principal = rctx.principal.name.clone();
    let new_priority = request.new_priority;
    let mutator = move |batch: &mut [Job]| -> BoxFuture<'static, ()> {
        for job in batch.iter_mut() {
            job.priority = new_priority;
        }
        let updated: Vec<Job> = batch.to_vec();
        let reporter = reporter.clone();
        let principal = principal.clone();
        Box::pin(async move {
            if let Err(error) = reporter.updated(&principal, &updated).await {
                warn!(error = %error, "updated-event emission failed");
            }
            if let Err(error) = reporter.reprioritized(&principal, &updated, new_priority).await {
                warn!(error = %error, "reprioritized-event emission failed");
            }
        })
    };

    let results = ctx.job_repository.update_jobs(&ids, &mutator).await?;
    info!(
        jobs = ids.len(),
        new_priority,
        failed = results.iter().filter(|(_, error)| !error.is_empty()).count(),
        "reprioritization finished"
    );
    Ok(ReprioritizeResponse { results: results.into_iter().collect() })
}

#[cfg(test)]
#[path = "reprioritize_tests.rs"]
mod tests;
