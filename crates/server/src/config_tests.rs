// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::SubmissionConfig;

#[test]
fn defaults_are_conservative() {
    let config = SubmissionConfig::default();
    assert!(!config.auto_create_queues);
    assert_eq!(config.default_queued_jobs_limit, 0);
    assert_eq!(config.cancel_deadline_leeway(), Duration::from_secs(1));
    assert_eq!(config.compressor_pool.max_total, 100);
    assert_eq!(config.compressor_pool.min_idle, 10);
    assert_eq!(config.compressor_pool.max_idle, 50);
}

#[test]
fn partial_toml_overrides_defaults() {
    let config = SubmissionConfig::from_toml_str(
        r#"
        auto_create_queues = true
        default_queued_jobs_limit = 50
        cancel_jobs_batch_size = 100

        [compressor_pool]
        max_total = 8

        [scheduling]
        max_pod_spec_size_bytes = 1024
        "#,
    )
    .unwrap();

    assert!(config.auto_create_queues);
    assert_eq!(config.default_queued_jobs_limit, 50);
    assert_eq!(config.cancel_jobs_batch_size, 100);
    assert_eq!(config.compressor_pool.max_total, 8);
    // untouched knobs keep their defaults
    assert_eq!(config.compressor_pool.max_idle, 50);
    assert_eq!(config.scheduling.max_pod_spec_size_bytes, 1024);
}

#[test]
fn from_file_reads_the_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flotilla.toml");
    std::fs::write(&path, "default_priority_factor = 2.5\n").unwrap();

    let config = SubmissionConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.default_priority_factor, 2.5);
}

#[test]
fn missing_file_is_a_read_error() {
    let err = SubmissionConfig::from_toml_file(std::path::Path::new("/nonexistent/flotilla.toml"))
        .unwrap_err();
    assert!(err.to_string().contains("could not read config"));
}

#[test]
fn zero_batch_size_is_guarded() {
    let config = SubmissionConfig { cancel_jobs_batch_size: 0, ..Default::default() };
    assert_eq!(config.cancel_batch_size(), 1);
}
