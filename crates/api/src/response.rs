// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use flotilla_core::{JobId, Queue};

/// Health probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Serving,
}

/// Outcome for one submitted item, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmitResponseItem {
    pub job_id: JobId,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobSubmitResponse {
    pub items: Vec<JobSubmitResponseItem>,
}

/// Ids of jobs actually deleted by a cancellation. Always a subset of the
/// requested set; partial under a tripped deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CancellationResult {
    pub cancelled_ids: Vec<JobId>,
}

/// Queue record plus its currently active job sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub name: String,
    pub active_job_sets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQueueFailure {
    pub queue: String,
    pub error: String,
}

/// Per-element failures from a batched queue create/update. An empty list
/// means every element succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchQueueResponse {
    pub failed_queues: Vec<BatchQueueFailure>,
}

/// Job id → error string; empty string means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReprioritizeResponse {
    pub results: HashMap<JobId, String>,
}

/// One message in the queue-catalog stream. The `End` marker is always the
/// final message, including on an empty catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueStreamMessage {
    #[serde(rename = "queue")]
    Queue { queue: Queue },
    #[serde(rename = "end")]
    End,
}
