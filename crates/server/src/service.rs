// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC façade: maps typed requests onto the handlers and failures onto
//! canonical status codes.

use std::sync::Arc;

use tokio::sync::mpsc;

use flotilla_api::{
    BatchQueueResponse, CancellationResult, HealthStatus, JobCancelRequest, JobSetCancelRequest,
    JobSubmitRequest, JobSubmitResponse, QueueInfo, QueueStreamMessage, ReprioritizeRequest,
    ReprioritizeResponse, Status,
};
use flotilla_core::{Clock, Queue};

use crate::auth::{ActionAuthorizer, AuthError, RequestContext};
use crate::cancel::{self, CancelError};
use crate::compress::{CompressError, CompressorPool};
use crate::config::SubmissionConfig;
use crate::events::{EventReporter, EventStore};
use crate::queues::{self, QueueAdminError};
use crate::reprioritize::{self, ReprioritizeError};
use crate::repository::{JobRepository, QueueRepository, SchedulingInfoRepository};
use crate::submit::{self, SubmitError};

/// Shared collaborators for all request handlers. The service is
/// stateless across requests except for the compressor pool.
pub struct ServiceCtx {
    pub config: SubmissionConfig,
    pub queue_repository: Arc<dyn QueueRepository>,
    pub job_repository: Arc<dyn JobRepository>,
    pub scheduling_info: Arc<dyn SchedulingInfoRepository>,
    pub authorizer: Arc<dyn ActionAuthorizer>,
    pub reporter: EventReporter,
    pub compressors: CompressorPool,
    pub clock: Arc<dyn Clock>,
}

impl ServiceCtx {
    pub fn new(
        config: SubmissionConfig,
        queue_repository: Arc<dyn QueueRepository>,
        job_repository: Arc<dyn JobRepository>,
        scheduling_info: Arc<dyn SchedulingInfoRepository>,
        authorizer: Arc<dyn ActionAuthorizer>,
        event_store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CompressError> {
        let compressors = CompressorPool::new(config.compressor_pool.clone())?;
        let reporter = EventReporter::new(event_store, Arc::clone(&clock));
        Ok(Self {
            config,
            queue_repository,
            job_repository,
            scheduling_info,
            authorizer,
            reporter,
            compressors,
            clock,
        })
    }
}

/// The submission control plane's RPC surface.
///
/// One async method per RPC; the transport host extracts the principal
/// and deadline into a [`RequestContext`] and maps [`Status`] onto its
/// own error space.
pub struct JobService {
    ctx: ServiceCtx,
}

impl JobService {
    pub fn new(ctx: ServiceCtx) -> Self {
        Self { ctx }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::Serving
    }

    pub async fn get_queue(&self, name: &str) -> Result<Queue, Status> {
        Ok(queues::handle_get_queue(&self.ctx, name).await?)
    }

    pub async fn get_queue_info(
        &self,
        rctx: &RequestContext,
        name: &str,
    ) -> Result<QueueInfo, Status> {
        Ok(queues::handle_get_queue_info(&self.ctx, rctx, name).await?)
    }

    pub async fn get_queues(
        &self,
        num: i64,
        sink: &mpsc::Sender<QueueStreamMessage>,
    ) -> Result<(), Status> {
        Ok(queues::handle_get_queues(&self.ctx, num, sink).await?)
    }

    pub async fn create_queue(&self, rctx: &RequestContext, queue: Queue) -> Result<(), Status> {
        Ok(queues::handle_create_queue(&self.ctx, rctx, queue).await?)
    }

    pub async fn create_queues(
        &self,
        rctx: &RequestContext,
        list: Vec<Queue>,
    ) -> Result<BatchQueueResponse, Status> {
        Ok(queues::handle_create_queues(&self.ctx, rctx, list).await)
    }

    pub async fn update_queue(&self, rctx: &RequestContext, queue: Queue) -> Result<(), Status> {
        Ok(queues::handle_update_queue(&self.ctx, rctx, queue).await?)
    }

    pub async fn update_queues(
        &self,
        rctx: &RequestContext,
        list: Vec<Queue>,
    ) -> Result<BatchQueueResponse, Status> {
        Ok(queues::handle_update_queues(&self.ctx, rctx, list).await)
    }

    pub async fn delete_queue(&self, rctx: &RequestContext, name: &str) -> Result<(), Status> {
        Ok(queues::handle_delete_queue(&self.ctx, rctx, name).await?)
    }

    pub async fn submit_jobs(
        &self,
        rctx: &RequestContext,
        request: JobSubmitRequest,
    ) -> Result<JobSubmitResponse, Status> {
        Ok(submit::handle_submit_jobs(&self.ctx, rctx, request).await?)
    }

    pub async fn cancel_jobs(
        &self,
        rctx: &RequestContext,
        request: JobCancelRequest,
    ) -> Result<CancellationResult, Status> {
        Ok(cancel::handle_cancel_jobs(&self.ctx, rctx, request).await?)
    }

    pub async fn cancel_job_set(
        &self,
        rctx: &RequestContext,
        request: JobSetCancelRequest,
    ) -> Result<(), Status> {
        cancel::handle_cancel_job_set(&self.ctx, rctx, request).await?;
        Ok(())
    }

    pub async fn reprioritize_jobs(
        &self,
        rctx: &RequestContext,
        request: ReprioritizeRequest,
    ) -> Result<ReprioritizeResponse, Status> {
        Ok(reprioritize::handle_reprioritize_jobs(&self.ctx, rctx, request).await?)
    }

    /// The shared context, for hosts that need collaborator access.
    pub fn ctx(&self) -> &ServiceCtx {
        &self.ctx
    }
}

fn auth_status(err: &AuthError) -> Status {
    if err.is_unauthorized() {
        Status::permission_denied(err.to_string())
    } else {
        Status::unavailable(err.to_string())
    }
}

impl From<QueueAdminError> for Status {
    fn from(err: QueueAdminError) -> Self {
        match err {
            QueueAdminError::Auth(e) => auth_status(&e),
            QueueAdminError::Invalid(e) => Status::invalid_argument(e.to_string()),
            QueueAdminError::AlreadyExists(_) => Status::already_exists(err.to_string()),
            QueueAdminError::NotFound(_) => Status::not_found(err.to_string()),
            QueueAdminError::NotEmpty(_) => Status::failed_precondition(err.to_string()),
            QueueAdminError::Backend(e) => Status::unavailable(e.to_string()),
            QueueAdminError::StreamClosed => Status::internal(err.to_string()),
        }
    }
}

impl From<SubmitError> for Status {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid { message, items } => {
                let status = Status::invalid_argument(message);
                if items.is_empty() {
                    status
                } else {
                    status.with_submit_items(items)
                }
            }
            SubmitError::Auth(e) => auth_status(&e),
            SubmitError::QueueMissing(_) => Status::aborted(err.to_string()),
            SubmitError::Backend(e) => Status::unavailable(e.to_string()),
            SubmitError::Emission(e) => Status::aborted(e.to_string()),
            SubmitError::PersistFailed(message) => Status::aborted(message),
            SubmitError::PostPersistence { message, items } => {
                Status::internal(message).with_submit_items(items)
            }
            SubmitError::Compress(e) => Status::internal(e.to_string()),
        }
    }
}

impl From<CancelError> for Status {
    fn from(err: CancelError) -> Self {
        match err {
            CancelError::Invalid { message } => Status::invalid_argument(message),
            CancelError::Auth { source, cancelled } => {
                auth_status(&source).with_cancelled_ids(cancelled)
            }
            CancelError::QueueNotFound { queue, cancelled } => {
                Status::not_found(format!("queue {queue:?} not found"))
                    .with_cancelled_ids(cancelled)
            }
            CancelError::Backend { source, cancelled } => {
                Status::unavailable(source.to_string()).with_cancelled_ids(cancelled)
            }
            CancelError::Emission { source, cancelled } => {
                Status::aborted(source.to_string()).with_cancelled_ids(cancelled)
            }
            CancelError::DeadlineExceeded { ref cancelled } => {
                Status::deadline_exceeded(err.to_string()).with_cancelled_ids(cancelled.clone())
            }
            CancelError::Internal(message) => Status::internal(message),
        }
    }
}

impl From<ReprioritizeError> for Status {
    fn from(err: ReprioritizeError) -> Self {
        match err {
            ReprioritizeError::Invalid { message } => Status::invalid_argument(message),
            ReprioritizeError::Auth(e) => auth_status(&e),
            ReprioritizeError::QueueNotFound(_) => Status::not_found(err.to_string()),
            ReprioritizeError::Backend(e) => Status::unavailable(e.to_string()),
            ReprioritizeError::Emission(e) => Status::aborted(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
