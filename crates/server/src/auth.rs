// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization gate: global permissions and per-queue verbs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use flotilla_core::{Clock, GlobalPermission, Job, Principal, Queue, QueueVerb, Subject};

use crate::repository::{QueueRepository, QueueRepositoryError};

/// Why an authorization check failed.
///
/// `Unauthorized` and `QueueVerbDenied` translate to permission-denied;
/// `Lookup` is a policy-backend failure and translates to unavailable.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("principal {principal:?} lacks permission {permission}")]
    Unauthorized { principal: String, permission: GlobalPermission },

    #[error("principal {principal:?} may not {verb} on queue {queue:?}")]
    QueueVerbDenied { principal: String, queue: String, verb: QueueVerb },

    #[error("authorization lookup failed: {0}")]
    Lookup(String),

    #[error("no principal in request metadata")]
    MissingPrincipal,
}

impl AuthError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized { .. } | AuthError::QueueVerbDenied { .. })
    }
}

/// Policy decisions for global actions and per-queue verbs.
#[async_trait]
pub trait ActionAuthorizer: Send + Sync {
    /// Check a singleton global permission.
    async fn authorize_action(
        &self,
        principal: &Principal,
        permission: GlobalPermission,
    ) -> Result<(), AuthError>;

    /// Grant when the principal holds the global permission, or when the
    /// queue's own permission table grants the verb.
    async fn authorize_queue_action(
        &self,
        principal: &Principal,
        queue: &Queue,
        permission: GlobalPermission,
        verb: QueueVerb,
    ) -> Result<(), AuthError>;
}

/// Authorizer over a static permission table, the shape produced by
/// config-driven policies.
#[derive(Default)]
pub struct StaticAuthorizer {
    grants: HashMap<GlobalPermission, Vec<Subject>>,
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, permission: GlobalPermission, subject: Subject) -> Self {
        self.grants.entry(permission).or_default().push(subject);
        self
    }

    fn holds(&self, principal: &Principal, permission: GlobalPermission) -> bool {
        self.grants
            .get(&permission)
            .is_some_and(|subjects| subjects.iter().any(|s| s.covers(principal)))
    }
}

#[async_trait]
impl ActionAuthorizer for StaticAuthorizer {
    async fn authorize_action(
        &self,
        principal: &Principal,
        permission: GlobalPermission,
    ) -> Result<(), AuthError> {
        if self.holds(principal, permission) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized { principal: principal.name.clone(), permission })
        }
    }

    async fn authorize_queue_action(
        &self,
        principal: &Principal,
        queue: &Queue,
        permission: GlobalPermission,
        verb: QueueVerb,
    ) -> Result<(), AuthError> {
        if self.holds(principal, permission) || queue.grants(principal, verb) {
            Ok(())
        } else {
            Err(AuthError::QueueVerbDenied {
                principal: principal.name.clone(),
                queue: queue.name.clone(),
                verb,
            })
        }
    }
}

/// Derives the calling principal from opaque transport metadata.
pub trait PrincipalExtractor: Send + Sync {
    fn extract(&self, metadata: &HashMap<String, String>) -> Result<Principal, AuthError>;
}

/// Extractor reading the principal name and comma-separated groups from
/// two metadata keys, the shape a trusted proxy injects.
pub struct HeaderPrincipalExtractor {
    pub user_key: String,
    pub groups_key: String,
}

impl Default for HeaderPrincipalExtractor {
    fn default() -> Self {
        Self { user_key: "x-flotilla-user".to_string(), groups_key: "x-flotilla-groups".to_string() }
    }
}

impl PrincipalExtractor for HeaderPrincipalExtractor {
    fn extract(&self, metadata: &HashMap<String, String>) -> Result<Principal, AuthError> {
        let name = metadata
            .get(&self.user_key)
            .filter(|name| !name.is_empty())
            .ok_or(AuthError::MissingPrincipal)?;
        let groups: Vec<String> = metadata
            .get(&self.groups_key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Principal::with_groups(name.clone(), groups))
    }
}

/// Per-request context: the authenticated principal, the transport
/// deadline, and a token cancelled when the client goes away.
#[derive(Clone)]
pub struct RequestContext {
    pub principal: Principal,
    pub deadline: Option<Instant>,
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal, deadline: None, cancel: CancellationToken::new() }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Time left until the deadline; `None` when the request has none.
    pub fn remaining(&self, clock: &dyn Clock) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(clock.now()))
    }
}

/// Failure authorizing a bulk operation across queues.
#[derive(Debug, Error)]
pub(crate) enum QueueAuthFailure {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] QueueRepositoryError),
}

/// Check `verb` (or the global permission) on every distinct queue named
/// by a batch of jobs. Any denial fails the whole batch.
pub(crate) async fn authorize_job_queues(
    authorizer: &dyn ActionAuthorizer,
    queues: &dyn QueueRepository,
    principal: &Principal,
    jobs: &[Job],
    permission: GlobalPermission,
    verb: QueueVerb,
) -> Result<(), QueueAuthFailure> {
    let mut checked = std::collections::HashSet::new();
    for job in jobs {
        if !checked.insert(job.queue.as_str()) {
            continue;
        }
        let queue = queues.get(&job.queue).await?;
        authorizer.authorize_queue_action(principal, &queue, permission, verb).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
