// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! flotilla-server: the job submission and lifecycle control plane.
//!
//! Accepts validated job batches into queues, administers the queue
//! catalog, and mediates cancellation and re-prioritization against a
//! pluggable job store, queue catalog, and event log. The RPC transport
//! hosting [`JobService`] lives outside this crate.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod auth;
pub mod compress;
pub mod config;
pub mod events;
pub mod repository;
pub mod scheduling;
pub mod service;

mod cancel;
mod queues;
mod reprioritize;
mod submit;

#[cfg(test)]
mod test_fixtures;

pub use auth::{
    ActionAuthorizer, AuthError, HeaderPrincipalExtractor, PrincipalExtractor, RequestContext,
    StaticAuthorizer,
};
pub use compress::{decompress_groups, CompressError, CompressorPool, PoolConfig};
pub use config::{ConfigError, SubmissionConfig};
pub use events::{EventReporter, EventStore, EventStoreError};
pub use repository::{
    BackendError, JobMutator, JobRepository, QueueRepository, QueueRepositoryError,
    SchedulingInfoRepository, SubmissionResult,
};
pub use scheduling::{ClusterSchedulingProfile, PodValidationError, SchedulingConfig};
pub use service::{JobService, ServiceCtx};
