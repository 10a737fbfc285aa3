// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation engine.
//!
//! Targets are addressed by id or by queue + job set, then processed in
//! batches to bound memory. A soft deadline is checked between batches so
//! a large cancellation surfaces a partial result instead of being killed
//! mid-batch.

use thiserror::Error;
use tracing::{info, warn};

use flotilla_api::{CancellationResult, JobCancelRequest, JobSetCancelRequest};
use flotilla_core::{GlobalPermission, JobId, JobSetFilter, QueueVerb};

use crate::auth::{authorize_job_queues, AuthError, QueueAuthFailure, RequestContext};
use crate::events::EventStoreError;
use crate::repository::{BackendError, QueueRepositoryError};
use crate::service::ServiceCtx;

/// Cancellation failure. Variants reached after the first batch carry the
/// ids already cancelled, so partial success stays visible to the caller.
#[derive(Debug, Error)]
pub(crate) enum CancelError {
    #[error("{message}")]
    Invalid { message: String },

    #[error("{source}")]
    Auth { source: AuthError, cancelled: Vec<JobId> },

    #[error("queue {queue:?} not found")]
    QueueNotFound { queue: String, cancelled: Vec<JobId> },

    #[error("{source}")]
    Backend { source: BackendError, cancelled: Vec<JobId> },

    #[error("event emission failed: {source}")]
    Emission { source: EventStoreError, cancelled: Vec<JobId> },

    #[error("deadline too close to continue after {} cancellations", cancelled.len())]
    DeadlineExceeded { cancelled: Vec<JobId> },

    #[error("{0}")]
    Internal(String),
}

/// Cancel a single job by id, or a whole job set by queue + job-set id.
pub(crate) async fn handle_cancel_jobs(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    request: JobCancelRequest,
) -> Result<CancellationResult, CancelError> {
    if let Some(id) = request.job_id {
        let jobs = ctx
            .job_repository
            .get_existing_jobs_by_ids(&[id])
            .await
            .map_err(|source| CancelError::Backend { source, cancelled: Vec::new() })?;
        if jobs.len() != 1 {
            return Err(CancelError::Internal(format!(
                "expected exactly one job for id {id}, repository returned {}",
                jobs.len(),
            )));
        }
        return cancel_job_ids(ctx, rctx, &[id], &request.reason).await;
    }

    if request.queue.is_empty() || request.job_set_id.is_empty() {
        return Err(CancelError::Invalid {
            message: "specify either a job id or a queue and job set id".to_string(),
        });
    }
    let ids = ctx
        .job_repository
        .get_job_set_job_ids(&request.queue, &request.job_set_id, &JobSetFilter::all())
        .await
        .map_err(|source| CancelError::Backend { source, cancelled: Vec::new() })?;
    cancel_job_ids(ctx, rctx, &ids, &request.reason).await
}

/// Cancel a job set, optionally restricted by a state filter. The filter
/// is validated up front; absent means all states.
pub(crate) async fn handle_cancel_job_set(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    request: JobSetCancelRequest,
) -> Result<CancellationResult, CancelError> {
    if request.queue.is_empty() || request.job_set_id.is_empty() {
        return Err(CancelError::Invalid {
            message: "queue and job set id must not be empty".to_string(),
        });
    }
    let filter = match &request.filter {
        None => JobSetFilter::all(),
        Some(spec) => JobSetFilter::from_states(&spec.states)
            .map_err(|err| CancelError::Invalid { message: err.to_string() })?,
    };
    let ids = ctx
        .job_repository
        .get_job_set_job_ids(&request.queue, &request.job_set_id, &filter)
        .await
        .map_err(|source| CancelError::Backend { source, cancelled: Vec::new() })?;
    cancel_job_ids(ctx, rctx, &ids, &request.reason).await
}

async fn cancel_job_ids(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    ids: &[JobId],
    reason: &str,
) -> Result<CancellationResult, CancelError> {
    let batch_size = ctx.config.cancel_batch_size();
    let leeway = ctx.config.cancel_deadline_leeway();
    let mut cancelled: Vec<JobId> = Vec::new();

    for batch_ids in ids.chunks(batch_size) {
        if let Some(remaining) = rctx.remaining(ctx.clock.as_ref()) {
            if remaining < leeway {
                return Err(CancelError::DeadlineExceeded { cancelled });
            }
        }
        if rctx.cancel.is_cancelled() {
            return Err(CancelError::DeadlineExceeded { cancelled });
        }

        let jobs = ctx
            .job_repository
            .get_existing_jobs_by_ids(batch_ids)
            .await
            .map_err(|source| CancelError::Backend { source, cancelled: cancelled.clone() })?;

        authorize_job_queues(
            ctx.authorizer.as_ref(),
            ctx.queue_repository.as_ref(),
            &rctx.principal,
            &jobs,
            GlobalPermission::CancelAnyJobs,
            QueueVerb::Cancel,
        )
        .await
        .map_err(|failure| match failure {
            QueueAuthFailure::Auth(source) => {
                CancelError::Auth { source, cancelled: cancelled.clone() }
            }
            QueueAuthFailure::Repository(QueueRepositoryError::NotFound(queue)) => {
                CancelError::QueueNotFound { queue, cancelled: cancelled.clone() }
            }
            QueueAuthFailure::Repository(other) => CancelError::Backend {
                source: BackendError(other.to_string()),
                cancelled: cancelled.clone(),
            },
        })?;

        ctx.reporter
            .cancelling(&rctx.principal.name, &jobs, reason)
            .await
            .map_err(|source| CancelError::Emission { source, cancelled: cancelled.clone() })?;

        let outcome = ctx
            .job_repository
            .delete_jobs(&jobs)
            .await
            .map_err(|source| CancelError::Backend { source, cancelled: cancelled.clone() })?;

        let mut succeeded = Vec::with_capacity(jobs.len());
        for job in jobs {
            match outcome.get(&job.id) {
                Some(None) => {
                    cancelled.push(job.id);
                    succeeded.push(job);
                }
                Some(Some(error)) => {
                    warn!(job_id = %job.id, error = %error, "job delete failed");
                }
                None => {
                    warn!(job_id = %job.id, "job missing from delete result");
                }
            }
        }

        ctx.reporter
            .cancelled(&rctx.principal.name, &succeeded, reason)
            .await
            .map_err(|source| CancelError::Emission { source, cancelled: cancelled.clone() })?;
    }

    info!(requested = ids.len(), cancelled = cancelled.len(), "cancellation finished");
    Ok(CancellationResult { cancelled_ids: cancelled })
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
