// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use proptest::prelude::*;
use yare::parameterized;

use flotilla_core::{JobId, Principal, DEFAULT_NAMESPACE};

use super::{check_cross_item_rules, create_jobs, enrich_text, CreateJobsError};
use crate::scheduling::SchedulingConfig;
use crate::test_fixtures::{make_item, make_pod_spec, make_request};

fn run_create_jobs(
    request: &flotilla_api::JobSubmitRequest,
) -> Result<Vec<flotilla_core::Job>, CreateJobsError> {
    create_jobs(
        &SchedulingConfig::default(),
        &Principal::with_groups("alice", ["crew".to_string()]),
        b"blob",
        request,
        Utc::now(),
    )
}

#[test]
fn builds_one_job_per_item_with_increasing_ids() {
    let request = make_request("payroll", "nightly", 3);
    let jobs = run_create_jobs(&request).unwrap();

    assert_eq!(jobs.len(), 3);
    assert!(jobs.windows(2).all(|pair| pair[0].id < pair[1].id));
    for job in &jobs {
        assert_eq!(job.queue, "payroll");
        assert_eq!(job.job_set_id, "nightly");
        assert_eq!(job.namespace, DEFAULT_NAMESPACE);
        assert_eq!(job.owner, "alice");
        assert_eq!(job.compressed_owner_groups, b"blob");
        assert_eq!(job.pod_specs.len(), 1);
    }
}

#[parameterized(
    empty_queue = { "", "nightly" },
    empty_job_set = { "payroll", "" },
)]
fn empty_identifiers_rejected(queue: &str, job_set_id: &str) {
    let request = make_request(queue, job_set_id, 1);
    assert!(run_create_jobs(&request).is_err());
}

#[test]
fn both_spec_forms_rejected_with_minted_id() {
    let mut request = make_request("payroll", "nightly", 1);
    request.items[0].pod_specs = vec![make_pod_spec()];

    match run_create_jobs(&request).unwrap_err() {
        CreateJobsError::Items { failed, total, failures } => {
            assert_eq!((failed, total), (1, 1));
            assert!(failures[0].error.contains("both podSpec and podSpecs"));
        }
        other => panic!("expected item failures, got: {:?}", other),
    }
}

#[test]
fn missing_spec_rejected() {
    let mut request = make_request("payroll", "nightly", 1);
    request.items[0].pod_spec = None;

    match run_create_jobs(&request).unwrap_err() {
        CreateJobsError::Items { failures, .. } => {
            assert!(failures[0].error.contains("no pod spec"));
        }
        other => panic!("expected item failures, got: {:?}", other),
    }
}

#[test]
fn one_bad_item_fails_the_stage_but_reports_only_that_item() {
    let mut request = make_request("payroll", "nightly", 3);
    request.items[1].pod_spec = None;

    match run_create_jobs(&request).unwrap_err() {
        CreateJobsError::Items { failed, total, failures } => {
            assert_eq!((failed, total), (1, 3));
            assert_eq!(failures.len(), 1);
        }
        other => panic!("expected item failures, got: {:?}", other),
    }
}

#[test]
fn required_node_labels_merge_into_the_selector() {
    let mut request = make_request("payroll", "nightly", 1);
    request.items[0].required_node_labels =
        [("zone".to_string(), "east".to_string())].into();
    let mut spec = make_pod_spec();
    spec.node_selector = Some([("disk".to_string(), "ssd".to_string())].into());
    request.items[0].pod_spec = Some(spec);

    let jobs = run_create_jobs(&request).unwrap();
    let selector = jobs[0].pod_specs[0].node_selector.clone().unwrap();
    assert_eq!(selector.get("zone"), Some(&"east".to_string()));
    assert_eq!(selector.get("disk"), Some(&"ssd".to_string()));
}

#[test]
fn labels_and_annotations_are_enriched() {
    let mut request = make_request("payroll", "nightly", 1);
    request.items[0].labels =
        [("tracker".to_string(), "run-{JobId}".to_string())].into();
    request.items[0].annotations =
        [("doc".to_string(), "literal {{JobId}} and real {JobId}".to_string())].into();

    let jobs = run_create_jobs(&request).unwrap();
    let id = jobs[0].id.to_string();
    assert_eq!(jobs[0].labels["tracker"], format!("run-{id}"));
    assert_eq!(jobs[0].annotations["doc"], format!("literal JobId and real {id}"));
}

#[test]
fn cross_item_rules_flag_repeated_client_ids() {
    let mut request = make_request("payroll", "nightly", 3);
    request.items[0].client_id = Some("c-1".to_string());
    request.items[1].client_id = Some("c-1".to_string());
    request.items[2].client_id = Some("c-2".to_string());
    let jobs = run_create_jobs(&request).unwrap();

    let failures = check_cross_item_rules(&jobs);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].job_id, jobs[1].id);
    assert!(failures[0].error.contains("c-1"));
}

#[test]
fn cross_item_rules_ignore_absent_client_ids() {
    let request = make_request("payroll", "nightly", 3);
    let jobs = run_create_jobs(&request).unwrap();
    assert!(check_cross_item_rules(&jobs).is_empty());
}

#[parameterized(
    plain_token = { "tag-{JobId}" },
    escaped_token = { "{{JobId}}" },
    mixed = { "{{JobId}}-{JobId}" },
)]
fn enrichment_resolves_tokens(text: &str) {
    let id = JobId::new();
    let enriched = enrich_text(text, id);
    assert!(!enriched.contains("{JobId}"));
    assert!(enriched == enrich_text(&enriched, id));
}

#[test]
fn escaped_token_becomes_the_literal_string() {
    let id = JobId::new();
    assert_eq!(enrich_text("{{JobId}}", id), "JobId");
    assert_eq!(enrich_text("{JobId}", id), id.to_string());
}

proptest! {
    #[test]
    fn enrichment_is_idempotent(prefix in ".{0,16}", middle in ".{0,16}", suffix in ".{0,16}") {
        let id = JobId::new();
        let text = format!("{prefix}{{JobId}}{middle}{{{{JobId}}}}{suffix}");
        let once = enrich_text(&text, id);
        prop_assert_eq!(enrich_text(&once, id), once);
    }
}
