// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, interface defined here, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `PolicyRepository` | `Policy` | `InMemoryPolicyRepository` |

use async_trait::async_trait;
use crate::domain::policy::{Policy, PolicyId};

/// Repository interface for Policy aggregates
///
/// Policy versions are append-only: `save_version` never replaces a stored
/// version.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Store a new version. Fails with `Conflict` if that version already exists.
    async fn save_version(&self, policy: &Policy) -> Result<(), RepositoryError>;

    /// Latest stored version of a policy
    async fn find_latest(&self, id: &PolicyId) -> Result<Option<Policy>, RepositoryError>;

    /// All stored versions, oldest first
    async fn history(&self, id: &PolicyId) -> Result<Vec<Policy>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
