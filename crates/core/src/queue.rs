// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue records and per-queue permission grants.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::principal::{Principal, Subject};

/// Per-queue verbs a permission grant can confer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueVerb {
    Submit,
    Cancel,
    Reprioritize,
    Watch,
}

impl QueueVerb {
    pub const ALL: [QueueVerb; 4] =
        [QueueVerb::Submit, QueueVerb::Cancel, QueueVerb::Reprioritize, QueueVerb::Watch];
}

crate::simple_display! {
    QueueVerb {
        Submit => "submit",
        Cancel => "cancel",
        Reprioritize => "reprioritize",
        Watch => "watch",
    }
}

/// One permission grant: a set of subjects and the verbs they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuePermissions {
    pub subjects: Vec<Subject>,
    pub verbs: Vec<QueueVerb>,
}

impl QueuePermissions {
    /// Grant every verb to a single subject (the owner grant shape).
    pub fn owner(subject: Subject) -> Self {
        Self { subjects: vec![subject], verbs: QueueVerb::ALL.to_vec() }
    }
}

/// A tenant-facing submission point.
///
/// Queues are created through the admin surface and mutated only by
/// wholesale update; permission grants keep their submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    pub priority_factor: f64,
    #[serde(default)]
    pub permissions: Vec<QueuePermissions>,
    /// Optional per-resource caps, as a fraction of pool capacity.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resource_limits: IndexMap<String, f64>,
}

/// Validation failure for a queue record.
#[derive(Debug, Error, PartialEq)]
pub enum QueueValidationError {
    #[error("queue name must not be empty")]
    EmptyName,

    #[error("queue name {0:?} may only contain lowercase alphanumerics and dashes")]
    InvalidName(String),

    #[error("queue priority factor must be positive, got {0}")]
    NonPositivePriorityFactor(f64),

    #[error("permission grant #{0} names no subjects")]
    EmptySubjects(usize),

    #[error("resource limit for {0:?} must be positive, got {1}")]
    InvalidResourceLimit(String, f64),
}

impl Queue {
    pub fn new(name: impl Into<String>, priority_factor: f64) -> Self {
        Self {
            name: name.into(),
            priority_factor,
            permissions: Vec::new(),
            resource_limits: IndexMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), QueueValidationError> {
        if self.name.is_empty() {
            return Err(QueueValidationError::EmptyName);
        }
        if !self.name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(QueueValidationError::InvalidName(self.name.clone()));
        }
        if !(self.priority_factor > 0.0) {
            return Err(QueueValidationError::NonPositivePriorityFactor(self.priority_factor));
        }
        for (i, grant) in self.permissions.iter().enumerate() {
            if grant.subjects.is_empty() {
                return Err(QueueValidationError::EmptySubjects(i));
            }
        }
        for (resource, limit) in &self.resource_limits {
            if !(*limit > 0.0) {
                return Err(QueueValidationError::InvalidResourceLimit(resource.clone(), *limit));
            }
        }
        Ok(())
    }

    /// Whether the queue's permission table grants `verb` to the principal,
    /// directly or through one of its groups.
    pub fn grants(&self, principal: &Principal, verb: QueueVerb) -> bool {
        self.permissions.iter().any(|grant| {
            grant.verbs.contains(&verb) && grant.subjects.iter().any(|s| s.covers(principal))
        })
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
