// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for handler tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use k8s_openapi::api::core::v1::{Container, PodSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use flotilla_api::{JobSubmitRequest, JobSubmitRequestItem};
use flotilla_core::{
    FakeClock, GlobalPermission, Job, JobId, Principal, Queue, QueuePermissions, Subject,
};

use crate::auth::{RequestContext, StaticAuthorizer};
use crate::config::SubmissionConfig;
use crate::repository::memory::{
    InMemoryEventStore, InMemoryJobRepository, InMemoryQueueRepository, StaticSchedulingInfo,
};
use crate::scheduling::ClusterSchedulingProfile;
use crate::service::ServiceCtx;

pub(crate) struct TestHarness {
    pub queue_repository: Arc<InMemoryQueueRepository>,
    pub job_repository: Arc<InMemoryJobRepository>,
    pub scheduling_info: Arc<StaticSchedulingInfo>,
    pub event_store: Arc<InMemoryEventStore>,
    pub clock: Arc<FakeClock>,
    pub ctx: ServiceCtx,
}

pub(crate) fn harness(config: SubmissionConfig, authorizer: StaticAuthorizer) -> TestHarness {
    let queue_repository = Arc::new(InMemoryQueueRepository::new());
    let job_repository = Arc::new(InMemoryJobRepository::new());
    let scheduling_info = Arc::new(StaticSchedulingInfo::new(vec![big_cluster()]));
    let event_store = Arc::new(InMemoryEventStore::new());
    let clock = Arc::new(FakeClock::new());
    let ctx = ServiceCtx::new(
        config,
        Arc::clone(&queue_repository) as _,
        Arc::clone(&job_repository) as _,
        Arc::clone(&scheduling_info) as _,
        Arc::new(authorizer),
        Arc::clone(&event_store) as _,
        Arc::clone(&clock) as _,
    )
    .unwrap();
    TestHarness { queue_repository, job_repository, scheduling_info, event_store, clock, ctx }
}

/// Authorizer granting the listed permissions to the user `alice`.
pub(crate) fn alice_authorizer(permissions: &[GlobalPermission]) -> StaticAuthorizer {
    let mut authorizer = StaticAuthorizer::new();
    for permission in permissions {
        authorizer = authorizer.grant(*permission, Subject::User("alice".to_string()));
    }
    authorizer
}

pub(crate) fn alice() -> RequestContext {
    RequestContext::new(Principal::with_groups("alice", ["crew".to_string()]))
}

pub(crate) fn big_cluster() -> ClusterSchedulingProfile {
    ClusterSchedulingProfile {
        cluster_id: "cluster-a".to_string(),
        allocatable: [
            ("cpu".to_string(), Quantity("1000".to_string())),
            ("memory".to_string(), Quantity("4Ti".to_string())),
        ]
        .into(),
        node_labels: [("zone".to_string(), "east".to_string())].into(),
    }
}

pub(crate) fn make_pod_spec() -> PodSpec {
    let resources: BTreeMap<String, Quantity> = [
        ("cpu".to_string(), Quantity("1".to_string())),
        ("memory".to_string(), Quantity("1Gi".to_string())),
    ]
    .into();
    PodSpec {
        containers: vec![Container {
            name: "main".to_string(),
            resources: Some(ResourceRequirements {
                requests: Some(resources.clone()),
                limits: Some(resources),
                ..Default::default()
            }),
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub(crate) fn make_item() -> JobSubmitRequestItem {
    JobSubmitRequestItem {
        priority: 1.0,
        pod_spec: Some(make_pod_spec()),
        ..Default::default()
    }
}

pub(crate) fn make_request(queue: &str, job_set_id: &str, items: usize) -> JobSubmitRequest {
    JobSubmitRequest {
        queue: queue.to_string(),
        job_set_id: job_set_id.to_string(),
        items: (0..items).map(|_| make_item()).collect(),
    }
}

pub(crate) fn make_queue(name: &str) -> Queue {
    let mut queue = Queue::new(name, 1.0);
    queue.permissions.push(QueuePermissions::owner(Subject::User("alice".to_string())));
    queue
}

pub(crate) fn make_job(queue: &str, job_set_id: &str) -> Job {
    Job {
        id: JobId::new(),
        queue: queue.to_string(),
        job_set_id: job_set_id.to_string(),
        client_id: None,
        namespace: "default".to_string(),
        owner: "alice".to_string(),
        labels: Default::default(),
        annotations: Default::default(),
        priority: 1.0,
        scheduler: None,
        pod_specs: vec![make_pod_spec()],
        ingress: Vec::new(),
        services: Vec::new(),
        compressed_owner_groups: Vec::new(),
        created: Utc::now(),
        queue_ttl_seconds: None,
    }
}
