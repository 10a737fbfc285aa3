// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded pool of reusable zstd compressors.
//!
//! Intake compresses each submission's ownership-groups list through a
//! fixed-capacity pool of reusable compressor contexts: borrowers block
//! when the pool is exhausted and the RAII guard returns the compressor
//! on every exit path.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use zstd::bulk::{Compressor, Decompressor};
use zstd::zstd_safe::CParameter;

/// Upper bound when inflating an ownership blob.
const MAX_GROUPS_BLOB_BYTES: usize = 1 << 20;

/// Pool sizing and codec parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard cap on concurrently borrowed compressors.
    pub max_total: usize,
    /// Compressors built up-front.
    pub min_idle: usize,
    /// Idle compressors kept for reuse; extras are dropped on return.
    pub max_idle: usize,
    pub level: i32,
    /// Fixed zstd window (log2 of the window size in bytes).
    pub window_log: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_total: 100, min_idle: 10, max_idle: 50, level: 3, window_log: 19 }
    }
}

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("compressor pool capacity must be positive")]
    ZeroCapacity,

    #[error("compressor pool closed")]
    PoolClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("group list encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

fn new_compressor(config: &PoolConfig) -> Result<Compressor<'static>, CompressError> {
    let mut compressor = Compressor::new(config.level)?;
    compressor.set_parameter(CParameter::WindowLog(config.window_log))?;
    Ok(compressor)
}

/// Fixed-capacity pool of reusable compressors.
pub struct CompressorPool {
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<Compressor<'static>>>,
    config: PoolConfig,
}

impl CompressorPool {
    /// Build a pool, pre-warming `min_idle` compressors.
    pub fn new(config: PoolConfig) -> Result<Self, CompressError> {
        if config.max_total == 0 {
            return Err(CompressError::ZeroCapacity);
        }
        let mut idle = Vec::with_capacity(config.min_idle);
        for _ in 0..config.min_idle.min(config.max_total) {
            idle.push(new_compressor(&config)?);
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(config.max_total)),
            idle: Mutex::new(idle),
            config,
        })
    }

    /// Borrow a compressor, waiting while the pool is exhausted. The wait
    /// is cancel-safe: dropping the future gives up the spot in line.
    pub async fn acquire(&self) -> Result<PooledCompressor<'_>, CompressError> {
        let permit =
            self.permits.acquire().await.map_err(|_| CompressError::PoolClosed)?;
        let idle = self.idle.lock().pop();
        let inner = match idle {
            Some(compressor) => compressor,
            None => new_compressor(&self.config)?,
        };
        Ok(PooledCompressor { pool: self, inner: Some(inner), _permit: permit })
    }

    /// Borrow slots currently available.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Compressors currently sitting idle.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

/// A borrowed compressor. Dropping it returns the compressor to the pool
/// (up to `max_idle`) and frees the borrow slot.
pub struct PooledCompressor<'a> {
    pool: &'a CompressorPool,
    inner: Option<Compressor<'static>>,
    _permit: SemaphorePermit<'a>,
}

impl PooledCompressor<'_> {
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        match self.inner.as_mut() {
            Some(compressor) => Ok(compressor.compress(data)?),
            // inner is taken only in Drop
            None => unreachable!("compress on returned compressor"),
        }
    }

    /// Compress a principal's group names into the ownership blob
    /// (JSON-encoded list, then zstd).
    pub fn compress_groups(&mut self, groups: &[String]) -> Result<Vec<u8>, CompressError> {
        let encoded = serde_json::to_vec(groups)?;
        self.compress(&encoded)
    }
}

impl Drop for PooledCompressor<'_> {
    fn drop(&mut self) {
        if let Some(compressor) = self.inner.take() {
            let mut idle = self.pool.idle.lock();
            if idle.len() < self.pool.config.max_idle {
                idle.push(compressor);
            }
        }
    }
}

/// Inflate an ownership blob back to group names.
pub fn decompress_groups(blob: &[u8]) -> Result<Vec<String>, CompressError> {
    let raw = Decompressor::new()?.decompress(blob, MAX_GROUPS_BLOB_BYTES)?;
    Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
#[path = "compress_tests.rs"]
mod tests;
