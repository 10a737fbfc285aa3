// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical status codes and error payloads for the RPC surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flotilla_core::JobId;

use super::JobSubmitResponseItem;

/// Maximum per-item entries attached to a status detail payload.
pub const MAX_RESPONSE_ITEMS: usize = 5;

/// Canonical RPC status codes, matching the gRPC code space the transport
/// maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Code {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    FailedPrecondition,
    Aborted,
    Unavailable,
    DeadlineExceeded,
    Internal,
}

flotilla_core::simple_display! {
    Code {
        InvalidArgument => "invalid-argument",
        NotFound => "not-found",
        AlreadyExists => "already-exists",
        PermissionDenied => "permission-denied",
        FailedPrecondition => "failed-precondition",
        Aborted => "aborted",
        Unavailable => "unavailable",
        DeadlineExceeded => "deadline-exceeded",
        Internal => "internal",
    }
}

/// Structured detail attached to an error status so clients can see which
/// inputs failed or which work completed before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatusDetails {
    /// Truncated per-item submit failures, in input order.
    #[serde(rename = "detail:submit-items")]
    SubmitItems { items: Vec<JobSubmitResponseItem> },

    /// Jobs already cancelled when a bulk cancellation stopped early.
    #[serde(rename = "detail:cancelled-ids")]
    CancelledIds { cancelled_ids: Vec<JobId> },
}

/// Failure surfaced by the RPC façade.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: Code,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: None }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(Code::AlreadyExists, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(Code::PermissionDenied, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(Code::FailedPrecondition, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(Code::Aborted, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(Code::DeadlineExceeded, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// Attach per-item submit failures, truncated to [`MAX_RESPONSE_ITEMS`]
    /// in input order.
    pub fn with_submit_items(mut self, mut items: Vec<JobSubmitResponseItem>) -> Self {
        items.truncate(MAX_RESPONSE_ITEMS);
        self.details = Some(StatusDetails::SubmitItems { items });
        self
    }

    /// Attach the ids cancelled before a bulk cancellation stopped.
    pub fn with_cancelled_ids(mut self, cancelled_ids: Vec<JobId>) -> Self {
        self.details = Some(StatusDetails::CancelledIds { cancelled_ids });
        self
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
