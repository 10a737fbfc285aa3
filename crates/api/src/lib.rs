// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport-neutral RPC contract for the Flotilla control plane.
//!
//! The transport (gRPC, socket framing, …) lives outside this workspace;
//! these types define what travels over it: request and response DTOs plus
//! canonical status codes with per-item detail payloads.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod status;

pub use request::{
    JobCancelRequest, JobSetCancelRequest, JobSetFilterSpec, JobSubmitRequest,
    JobSubmitRequestItem, ReprioritizeRequest,
};
pub use response::{
    BatchQueueFailure, BatchQueueResponse, CancellationResult, HealthStatus, JobSubmitResponse,
    JobSubmitResponseItem, QueueInfo, QueueStreamMessage, ReprioritizeResponse,
};
pub use status::{Code, Status, StatusDetails, MAX_RESPONSE_ITEMS};
