// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use flotilla_api::{Code, HealthStatus, JobSubmitResponseItem, Status, StatusDetails};
use flotilla_core::{GlobalPermission, JobId, QueueValidationError};

use super::JobService;
use crate::auth::AuthError;
use crate::cancel::CancelError;
use crate::events::EventStoreError;
use crate::queues::QueueAdminError;
use crate::repository::BackendError;
use crate::reprioritize::ReprioritizeError;
use crate::submit::SubmitError;
use crate::test_fixtures::{alice_authorizer, harness};

fn unauthorized() -> AuthError {
    AuthError::Unauthorized {
        principal: "mallory".to_string(),
        permission: GlobalPermission::CreateQueue,
    }
}

#[test]
fn health_always_serves() {
    let h = harness(Default::default(), alice_authorizer(&[]));
    let service = JobService::new(h.ctx);
    assert_eq!(service.health(), HealthStatus::Serving);
}

#[test]
fn queue_admin_codes() {
    let cases: Vec<(QueueAdminError, Code)> = vec![
        (QueueAdminError::Auth(unauthorized()), Code::PermissionDenied),
        (
            QueueAdminError::Auth(AuthError::Lookup("ldap down".to_string())),
            Code::Unavailable,
        ),
        (
            QueueAdminError::Invalid(QueueValidationError::EmptyName),
            Code::InvalidArgument,
        ),
        (QueueAdminError::AlreadyExists("q".to_string()), Code::AlreadyExists),
        (QueueAdminError::NotFound("q".to_string()), Code::NotFound),
        (QueueAdminError::NotEmpty("q".to_string()), Code::FailedPrecondition),
        (
            QueueAdminError::Backend(BackendError("down".to_string())),
            Code::Unavailable,
        ),
    ];
    for (err, code) in cases {
        assert_eq!(Status::from(err).code, code);
    }
}

#[test]
fn submit_codes() {
    let item = JobSubmitResponseItem { job_id: JobId::new(), error: "bad".to_string() };
    let cases: Vec<(SubmitError, Code)> = vec![
        (
            SubmitError::Invalid { message: "bad".to_string(), items: vec![item.clone()] },
            Code::InvalidArgument,
        ),
        (SubmitError::Auth(unauthorized()), Code::PermissionDenied),
        (SubmitError::QueueMissing("q".to_string()), Code::Aborted),
        (SubmitError::Backend(BackendError("down".to_string())), Code::Unavailable),
        (
            SubmitError::Emission(EventStoreError("log".to_string())),
            Code::Aborted,
        ),
        (SubmitError::PersistFailed("boom".to_string()), Code::Aborted),
        (
            SubmitError::PostPersistence { message: "log".to_string(), items: vec![item.clone()] },
            Code::Internal,
        ),
    ];
    for (err, code) in cases {
        assert_eq!(Status::from(err).code, code);
    }
}

#[test]
fn submit_invalid_carries_truncated_items() {
    let items: Vec<JobSubmitResponseItem> = (0..9)
        .map(|i| JobSubmitResponseItem { job_id: JobId::new(), error: format!("e{i}") })
        .collect();
    let status =
        Status::from(SubmitError::Invalid { message: "bad".to_string(), items });

    match status.details {
        Some(StatusDetails::SubmitItems { items }) => assert_eq!(items.len(), 5),
        other => panic!("expected submit items, got: {:?}", other),
    }
}

#[test]
fn cancel_codes_carry_partial_progress() {
    let cancelled = vec![JobId::new(), JobId::new()];

    let status = Status::from(CancelError::DeadlineExceeded { cancelled: cancelled.clone() });
    assert_eq!(status.code, Code::DeadlineExceeded);
    assert_eq!(
        status.details,
        Some(StatusDetails::CancelledIds { cancelled_ids: cancelled.clone() })
    );

    let status = Status::from(CancelError::Auth {
        source: unauthorized(),
        cancelled: cancelled.clone(),
    });
    assert_eq!(status.code, Code::PermissionDenied);
    assert_eq!(status.details, Some(StatusDetails::CancelledIds { cancelled_ids: cancelled }));

    assert_eq!(
        Status::from(CancelError::Invalid { message: "no target".to_string() }).code,
        Code::InvalidArgument
    );
    assert_eq!(
        Status::from(CancelError::Internal("weird".to_string())).code,
        Code::Internal
    );
}

#[test]
fn reprioritize_codes() {
    let cases: Vec<(ReprioritizeError, Code)> = vec![
        (
            ReprioritizeError::Invalid { message: "bad".to_string() },
            Code::InvalidArgument,
        ),
        (ReprioritizeError::Auth(unauthorized()), Code::PermissionDenied),
        (ReprioritizeError::QueueNotFound("q".to_string()), Code::NotFound),
        (
            ReprioritizeError::Backend(BackendError("down".to_string())),
            Code::Unavailable,
        ),
        (
            ReprioritizeError::Emission(EventStoreError("log".to_string())),
            Code::Aborted,
        ),
    ];
    for (err, code) in cases {
        assert_eq!(Status::from(err).code, code);
    }
}
