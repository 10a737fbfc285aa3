// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue administration handlers.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use flotilla_api::{BatchQueueFailure, BatchQueueResponse, QueueInfo, QueueStreamMessage};
use flotilla_core::{
    GlobalPermission, Queue, QueuePermissions, QueueValidationError, QueueVerb, Subject,
};

use crate::auth::{AuthError, RequestContext};
use crate::repository::{BackendError, QueueRepositoryError};
use crate::service::ServiceCtx;

#[derive(Debug, Error)]
pub(crate) enum QueueAdminError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid queue: {0}")]
    Invalid(#[from] QueueValidationError),

    #[error("queue {0:?} already exists")]
    AlreadyExists(String),

    #[error("queue {0:?} not found")]
    NotFound(String),

    #[error("queue {0:?} still has active job sets")]
    NotEmpty(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("queue stream receiver dropped")]
    StreamClosed,
}

impl From<QueueRepositoryError> for QueueAdminError {
    fn from(err: QueueRepositoryError) -> Self {
        match err {
            QueueRepositoryError::NotFound(name) => QueueAdminError::NotFound(name),
            QueueRepositoryError::AlreadyExists(name) => QueueAdminError::AlreadyExists(name),
            QueueRepositoryError::Backend(err) => QueueAdminError::Backend(err),
        }
    }
}

/// Create a queue. Callers supplying no grants become sole owner.
pub(crate) async fn handle_create_queue(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    mut queue: Queue,
) -> Result<(), QueueAdminError> {
    ctx.authorizer.authorize_action(&rctx.principal, GlobalPermission::CreateQueue).await?;

    if queue.permissions.is_empty() {
        queue
            .permissions
            .push(QueuePermissions::owner(Subject::User(rctx.principal.name.clone())));
    }
    queue.validate()?;

    let name = queue.name.clone();
    ctx.queue_repository.create(queue).await?;
    info!(queue = %name, "queue created");
    Ok(())
}

/// Per-element create; never aborts mid-batch.
pub(crate) async fn handle_create_queues(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    queues: Vec<Queue>,
) -> BatchQueueResponse {
    let mut failed_queues = Vec::new();
    for queue in queues {
        let name = queue.name.clone();
        if let Err(err) = handle_create_queue(ctx, rctx, queue).await {
            failed_queues.push(BatchQueueFailure { queue: name, error: err.to_string() });
        }
    }
    BatchQueueResponse { failed_queues }
}

/// Replace a queue record wholesale. Gated on the create permission.
pub(crate) async fn handle_update_queue(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    queue: Queue,
) -> Result<(), QueueAdminError> {
    ctx.authorizer.authorize_action(&rctx.principal, GlobalPermission::CreateQueue).await?;
    queue.validate()?;

    let name = queue.name.clone();
    ctx.queue_repository.update(queue).await?;
    info!(queue = %name, "queue updated");
    Ok(())
}

pub(crate) async fn handle_update_queues(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    queues: Vec<Queue>,
) -> BatchQueueResponse {
    let mut failed_queues = Vec::new();
    for queue in queues {
        let name = queue.name.clone();
        if let Err(err) = handle_update_queue(ctx, rctx, queue).await {
            failed_queues.push(BatchQueueFailure { queue: name, error: err.to_string() });
        }
    }
    BatchQueueResponse { failed_queues }
}

/// Delete a queue. Refused while any job set is still active; there is
/// no cascade.
pub(crate) async fn handle_delete_queue(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    name: &str,
) -> Result<(), QueueAdminError> {
    ctx.authorizer.authorize_action(&rctx.principal, GlobalPermission::DeleteQueue).await?;

    let active = ctx.job_repository.get_queue_active_job_sets(name).await?;
    if !active.is_empty() {
        return Err(QueueAdminError::NotEmpty(name.to_string()));
    }

    ctx.queue_repository.delete(name).await?;
    info!(queue = %name, "queue deleted");
    Ok(())
}

pub(crate) async fn handle_get_queue(
    ctx: &ServiceCtx,
    name: &str,
) -> Result<Queue, QueueAdminError> {
    Ok(ctx.queue_repository.get(name).await?)
}

/// Queue record plus the set of active job sets. Requires the watch verb.
pub(crate) async fn handle_get_queue_info(
    ctx: &ServiceCtx,
    rctx: &RequestContext,
    name: &str,
) -> Result<QueueInfo, QueueAdminError> {
    let queue = ctx.queue_repository.get(name).await?;
    ctx.authorizer
        .authorize_queue_action(
            &rctx.principal,
            &queue,
            GlobalPermission::WatchAllEvents,
            QueueVerb::Watch,
        )
        .await?;

    let active_job_sets = ctx.job_repository.get_queue_active_job_sets(name).await?;
    Ok(QueueInfo { name: queue.name, active_job_sets })
}

/// Stream at most `num` queues in catalog order, then the end marker.
/// `num <= 0` streams the whole catalog. The end marker is always sent,
/// including on an empty catalog.
pub(crate) async fn handle_get_queues(
    ctx: &ServiceCtx,
    num: i64,
    sink: &mpsc::Sender<QueueStreamMessage>,
) -> Result<(), QueueAdminError> {
    let queues = ctx.queue_repository.get_all().await?;
    let limit = if num > 0 { num as usize } else { usize::MAX };
    for queue in queues.into_iter().take(limit) {
        sink.send(QueueStreamMessage::Queue { queue })
            .await
            .map_err(|_| QueueAdminError::StreamClosed)?;
    }
    sink.send(QueueStreamMessage::End).await.map_err(|_| QueueAdminError::StreamClosed)?;
    Ok(())
}

#[cfg(test)]
#[path = "queues_tests.rs"]
mod tests;
