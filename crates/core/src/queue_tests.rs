// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yare::parameterized;

use super::{Queue, QueuePermissions, QueueValidationError, QueueVerb};
use crate::principal::{Principal, Subject};

fn queue_with_grant(subjects: Vec<Subject>, verbs: Vec<QueueVerb>) -> Queue {
    let mut queue = Queue::new("payroll", 1.0);
    queue.permissions.push(QueuePermissions { subjects, verbs });
    queue
}

#[test]
fn valid_queue_passes() {
    let queue = Queue::new("batch-7", 2.5);
    assert_eq!(queue.validate(), Ok(()));
}

#[parameterized(
    empty = { "", QueueValidationError::EmptyName },
    uppercase = { "Payroll", QueueValidationError::InvalidName("Payroll".to_string()) },
    spaces = { "pay roll", QueueValidationError::InvalidName("pay roll".to_string()) },
)]
fn bad_names_rejected(name: &str, expected: QueueValidationError) {
    assert_eq!(Queue::new(name, 1.0).validate(), Err(expected));
}

#[parameterized(
    zero = { 0.0 },
    negative = { -1.0 },
    nan = { f64::NAN },
)]
fn non_positive_priority_factor_rejected(factor: f64) {
    let err = Queue::new("q", factor).validate().unwrap_err();
    assert!(matches!(err, QueueValidationError::NonPositivePriorityFactor(_)));
}

#[test]
fn grant_without_subjects_rejected() {
    let queue = queue_with_grant(vec![], vec![QueueVerb::Submit]);
    assert_eq!(queue.validate(), Err(QueueValidationError::EmptySubjects(0)));
}

#[test]
fn non_positive_resource_limit_rejected() {
    let mut queue = Queue::new("q", 1.0);
    queue.resource_limits.insert("cpu".to_string(), 0.0);
    assert_eq!(
        queue.validate(),
        Err(QueueValidationError::InvalidResourceLimit("cpu".to_string(), 0.0))
    );
}

#[test]
fn grants_matches_user_subject() {
    let queue =
        queue_with_grant(vec![Subject::User("alice".to_string())], vec![QueueVerb::Submit]);

    assert!(queue.grants(&Principal::new("alice"), QueueVerb::Submit));
    assert!(!queue.grants(&Principal::new("alice"), QueueVerb::Cancel));
    assert!(!queue.grants(&Principal::new("bob"), QueueVerb::Submit));
}

#[test]
fn grants_matches_group_membership() {
    let queue =
        queue_with_grant(vec![Subject::Group("ops".to_string())], vec![QueueVerb::Cancel]);
    let member = Principal::with_groups("carol", ["ops".to_string()]);

    assert!(queue.grants(&member, QueueVerb::Cancel));
    assert!(!queue.grants(&Principal::new("carol"), QueueVerb::Cancel));
}

#[test]
fn everyone_grant_covers_all_principals() {
    let queue =
        queue_with_grant(vec![Subject::Group("everyone".to_string())], vec![QueueVerb::Watch]);
    assert!(queue.grants(&Principal::new("random"), QueueVerb::Watch));
}

#[test]
fn owner_grant_holds_every_verb() {
    let grant = QueuePermissions::owner(Subject::User("alice".to_string()));
    assert_eq!(grant.verbs.len(), 4);
}
