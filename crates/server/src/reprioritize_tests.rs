// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use flotilla_api::ReprioritizeRequest;
use flotilla_core::{GlobalPermission, JobId, JobState};

use super::{handle_reprioritize_jobs, ReprioritizeError};
use crate::test_fixtures::{alice, alice_authorizer, harness, make_job, make_queue, TestHarness};

fn reprioritize_harness() -> TestHarness {
    let h = harness(
        Default::default(),
        alice_authorizer(&[GlobalPermission::ReprioritizeAnyJobs]),
    );
    h.queue_repository.insert(make_queue("payroll"));
    h
}

fn seed_jobs(h: &TestHarness, count: usize) -> Vec<JobId> {
    (0..count)
        .map(|_| {
            let job = make_job("payroll", "nightly");
            let id = job.id;
            h.job_repository.insert(job, JobState::Queued);
            id
        })
        .collect()
}

fn by_ids(ids: &[JobId], new_priority: f64) -> ReprioritizeRequest {
    ReprioritizeRequest {
        job_ids: ids.to_vec(),
        queue: String::new(),
        job_set_id: String::new(),
        new_priority,
    }
}

#[tokio::test]
async fn sets_the_priority_and_emits_the_event_trail() {
    let h = reprioritize_harness();
    let ids = seed_jobs(&h, 2);

    let response =
        handle_reprioritize_jobs(&h.ctx, &alice(), by_ids(&ids, 7.5)).await.unwrap();

    assert_eq!(response.results.len(), 2);
    assert!(response.results.values().all(String::is_empty));
    for id in &ids {
        assert_eq!(h.job_repository.job(*id).unwrap().priority, 7.5);
    }
    assert_eq!(
        h.event_store.kinds(),
        vec![
            "reprioritizing",
            "reprioritizing",
            "updated",
            "updated",
            "reprioritized",
            "reprioritized",
        ]
    );
}

#[tokio::test]
async fn mixed_results_keep_per_job_errors() {
    let h = reprioritize_harness();
    let ids = seed_jobs(&h, 3);
    h.job_repository.fail_update(ids[1], "version conflict gave up");

    let response =
        handle_reprioritize_jobs(&h.ctx, &alice(), by_ids(&ids, 2.0)).await.unwrap();

    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[&ids[0]], "");
    assert_eq!(response.results[&ids[1]], "version conflict gave up");
    assert_eq!(response.results[&ids[2]], "");

    let kinds = h.event_store.kinds();
    assert!(kinds.contains(&"reprioritizing".to_string()));
    assert!(kinds.contains(&"updated".to_string()));
    assert!(kinds.contains(&"reprioritized".to_string()));

    // the failed job keeps its old priority, the others move
    assert_eq!(h.job_repository.job(ids[1]).unwrap().priority, 1.0);
    assert_eq!(h.job_repository.job(ids[0]).unwrap().priority, 2.0);
}

#[tokio::test]
async fn queue_and_job_set_addressing_resolves_active_ids() {
    let h = reprioritize_harness();
    let ids = seed_jobs(&h, 2);
    let request = ReprioritizeRequest {
        job_ids: Vec::new(),
        queue: "payroll".to_string(),
        job_set_id: "nightly".to_string(),
        new_priority: 4.0,
    };

    let response = handle_reprioritize_jobs(&h.ctx, &alice(), request).await.unwrap();

    assert_eq!(response.results.len(), 2);
    for id in ids {
        assert_eq!(h.job_repository.job(id).unwrap().priority, 4.0);
    }
}

#[tokio::test]
async fn missing_addressing_is_invalid() {
    let h = reprioritize_harness();
    let request = ReprioritizeRequest {
        job_ids: Vec::new(),
        queue: String::new(),
        job_set_id: String::new(),
        new_priority: 1.0,
    };

    let err = handle_reprioritize_jobs(&h.ctx, &alice(), request).await.unwrap_err();
    assert!(matches!(err, ReprioritizeError::Invalid { .. }));
}

#[tokio::test]
async fn non_finite_priority_is_invalid() {
    let h = reprioritize_harness();
    let ids = seed_jobs(&h, 1);

    let err =
        handle_reprioritize_jobs(&h.ctx, &alice(), by_ids(&ids, f64::NAN)).await.unwrap_err();
    assert!(matches!(err, ReprioritizeError::Invalid { .. }));
    assert!(h.event_store.is_empty());
}

#[tokio::test]
async fn unauthorized_queue_denies_the_whole_request() {
    let h = harness(Default::default(), alice_authorizer(&[]));
    h.queue_repository.insert(flotilla_core::Queue::new("locked", 1.0));
    let job = make_job("locked", "nightly");
    let id = job.id;
    h.job_repository.insert(job, JobState::Queued);

    let err =
        handle_reprioritize_jobs(&h.ctx, &alice(), by_ids(&[id], 2.0)).await.unwrap_err();

    assert!(matches!(err, ReprioritizeError::Auth(_)));
    assert_eq!(h.job_repository.job(id).unwrap().priority, 1.0);
    assert!(h.event_store.is_empty());
}

#[tokio::test]
async fn reprioritizing_emission_failure_aborts_before_the_write() {
    let h = reprioritize_harness();
    let ids = seed_jobs(&h, 1);
    h.event_store.set_outage("event log down");

    let err =
        handle_reprioritize_jobs(&h.ctx, &alice(), by_ids(&ids, 2.0)).await.unwrap_err();

    assert!(matches!(err, ReprioritizeError::Emission(_)));
    assert_eq!(h.job_repository.job(ids[0]).unwrap().priority, 1.0);
}

#[tokio::test]
async fn optimistic_retry_re_emits_mutator_events() {
    let h = reprioritize_harness();
    let ids = seed_jobs(&h, 1);
    h.job_repository.force_update_conflicts(1);

    handle_reprioritize_jobs(&h.ctx, &alice(), by_ids(&ids, 2.0)).await.unwrap();

    // the mutator ran twice, so its events appear twice; the pre-update
    // announcement does not repeat
    assert_eq!(
        h.event_store.kinds(),
        vec!["reprioritizing", "updated", "reprioritized", "updated", "reprioritized"]
    );
}
