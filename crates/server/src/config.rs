// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compress::PoolConfig;
use crate::scheduling::SchedulingConfig;

/// Top-level configuration for the submission control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Create missing queues at submit time for principals holding
    /// submit_any_jobs.
    pub auto_create_queues: bool,

    /// Per-queue cap on queued jobs; zero or negative disables the check.
    pub default_queued_jobs_limit: i64,

    /// Priority factor given to auto-created queues.
    pub default_priority_factor: f64,

    /// Jobs cancelled per repository round trip.
    pub cancel_jobs_batch_size: usize,

    /// Minimum context leeway required to start another cancellation batch.
    pub cancel_deadline_leeway_ms: u64,

    pub compressor_pool: PoolConfig,

    pub scheduling: SchedulingConfig,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            auto_create_queues: false,
            default_queued_jobs_limit: 0,
            default_priority_factor: 1.0,
            cancel_jobs_batch_size: 1000,
            cancel_deadline_leeway_ms: 1000,
            compressor_pool: PoolConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SubmissionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    /// Batch size with the zero guard applied.
    pub fn cancel_batch_size(&self) -> usize {
        self.cancel_jobs_batch_size.max(1)
    }

    pub fn cancel_deadline_leeway(&self) -> Duration {
        Duration::from_millis(self.cancel_deadline_leeway_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
