// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! ## In-Memory Repositories
//!
//! - **InMemoryPolicyRepository** - append-only policy version history

use std::sync::{Arc, RwLock};
use std::collections::HashMap;
use async_trait::async_trait;
use crate::domain::policy::{Policy, PolicyId};
use crate::domain::repository::{PolicyRepository, RepositoryError};

#[derive(Clone, Default)]
pub struct InMemoryPolicyRepository {
    versions: Arc<RwLock<HashMap<PolicyId, Vec<Policy>>>>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Unknown("policy store lock poisoned".to_string())
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn save_version(&self, policy: &Policy) -> Result<(), RepositoryError> {
        let mut versions = self.versions.write().map_err(poisoned)?;
        let history = versions.entry(policy.id.clone()).or_default();

        let expected = history.last().map(|p| p.version + 1).unwrap_or(1);
        if policy.version != expected {
            return Err(RepositoryError::Conflict(format!(
                "policy {} expects version {}, got {}",
                policy.id, expected, policy.version
            )));
        }

        history.push(policy.clone());
        Ok(())
    }

    async fn find_latest(&self, id: &PolicyId) -> Result<Option<Policy>, RepositoryError> {
        let versions = self.versions.read().map_err(poisoned)?;
        Ok(versions.get(id).and_then(|history| history.last().cloned()))
    }

    async fn history(&self, id: &PolicyId) -> Result<Vec<Policy>, RepositoryError> {
        let versions = self.versions.read().map_err(poisoned)?;
        Ok(versions.get(id).cloned().unwrap_or_default())
    }
}
