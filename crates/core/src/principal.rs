// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Principals and the permission vocabulary.

use serde::{Deserialize, Serialize};

/// Well-known group every authenticated principal implicitly belongs to.
pub const EVERYONE_GROUP: &str = "everyone";

/// Authenticated caller identity, derived from transport metadata by the
/// principal extractor before a request reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), groups: Vec::new() }
    }

    pub fn with_groups(name: impl Into<String>, groups: impl IntoIterator<Item = String>) -> Self {
        Self { name: name.into(), groups: groups.into_iter().collect() }
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        group == EVERYONE_GROUP || self.groups.iter().any(|g| g == group)
    }

    /// The principal's explicit groups, excluding the implicit `everyone`
    /// group. Used when auto-provisioning queue grants, where granting to
    /// `everyone` would make every caller an owner.
    pub fn named_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str).filter(|g| *g != EVERYONE_GROUP)
    }
}

/// Grantee of a queue permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Subject {
    User(String),
    Group(String),
}

impl Subject {
    /// Whether the subject covers the given principal. A `Group("everyone")`
    /// grant covers every principal.
    pub fn covers(&self, principal: &Principal) -> bool {
        match self {
            Subject::User(name) => *name == principal.name,
            Subject::Group(group) => principal.is_member_of(group),
        }
    }
}

/// Singleton permissions checked against the global authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalPermission {
    CreateQueue,
    DeleteQueue,
    SubmitAnyJobs,
    CancelAnyJobs,
    ReprioritizeAnyJobs,
    WatchAllEvents,
}

crate::simple_display! {
    GlobalPermission {
        CreateQueue => "create_queue",
        DeleteQueue => "delete_queue",
        SubmitAnyJobs => "submit_any_jobs",
        CancelAnyJobs => "cancel_any_jobs",
        ReprioritizeAnyJobs => "reprioritize_any_jobs",
        WatchAllEvents => "watch_all_events",
    }
}

#[cfg(test)]
#[path = "principal_tests.rs"]
mod tests;
