// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers.
//!
//! Job ids are ULIDs minted at intake: 128-bit, encoded as 26 Crockford
//! base32 characters, lexicographically ordered by mint time. Within one
//! submission batch ids are minted through a monotonic generator so they
//! sort in request-item order even inside the same millisecond.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// Unique identifier for a job, assigned once at intake and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Ulid);

/// Error parsing a job id from its string form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job id {text:?}: {source}")]
pub struct JobIdError {
    pub text: String,
    #[source]
    pub source: ulid::DecodeError,
}

impl JobId {
    /// Mint a fresh id from the current wall clock.
    ///
    /// Prefer [`JobIdGenerator`] when minting several ids in one request.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse an id from its canonical 26-character string form.
    pub fn parse(text: &str) -> Result<Self, JobIdError> {
        Ulid::from_string(text)
            .map(Self)
            .map_err(|source| JobIdError { text: text.to_string(), source })
    }

    /// Milliseconds since the Unix epoch encoded in the id.
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = JobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Ulid> for JobId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

/// Mints strictly increasing ids.
///
/// Ids minted by one generator within the same millisecond increment the
/// random component, preserving order. On the (astronomically unlikely)
/// random-component overflow, falls back to a fresh random id.
pub struct JobIdGenerator {
    inner: ulid::Generator,
}

impl JobIdGenerator {
    pub fn new() -> Self {
        Self { inner: ulid::Generator::new() }
    }

    pub fn next(&mut self) -> JobId {
        match self.inner.generate() {
            Ok(ulid) => JobId(ulid),
            Err(_) => JobId::new(),
        }
    }
}

impl Default for JobIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
