// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{GlobalPermission, Principal, Subject};

#[test]
fn user_subject_covers_only_that_user() {
    let alice = Principal::new("alice");
    let bob = Principal::new("bob");
    let subject = Subject::User("alice".to_string());

    assert!(subject.covers(&alice));
    assert!(!subject.covers(&bob));
}

#[test]
fn group_subject_covers_members() {
    let member = Principal::with_groups("alice", ["ops".to_string()]);
    let outsider = Principal::new("bob");
    let subject = Subject::Group("ops".to_string());

    assert!(subject.covers(&member));
    assert!(!subject.covers(&outsider));
}

#[test]
fn everyone_group_covers_any_principal() {
    let subject = Subject::Group("everyone".to_string());
    assert!(subject.covers(&Principal::new("anyone-at-all")));
}

#[test]
fn named_groups_excludes_everyone() {
    let principal =
        Principal::with_groups("alice", ["ops".to_string(), "everyone".to_string()]);
    let named: Vec<&str> = principal.named_groups().collect();
    assert_eq!(named, vec!["ops"]);
}

#[test]
fn permission_display_is_snake_case() {
    assert_eq!(GlobalPermission::SubmitAnyJobs.to_string(), "submit_any_jobs");
    assert_eq!(GlobalPermission::WatchAllEvents.to_string(), "watch_all_events");
}
