// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Application Service
//!
//! Accepts suppression-list updates for a policy. Every incoming list goes
//! through the `ConstraintValidator` before anything is stored; a rejected
//! list is reported with all of its violations and leaves the stored policy
//! untouched.
//!
//! ## Relationships
//! - Consumes `ConstraintValidator` domain service for structural validation
//! - Persists versions through `PolicyRepository`
//! - Publishes `SuppressionsUpdated` / `SuppressionsRejected` events

use crate::domain::events::PolicyEvent;
use crate::domain::policy::{Policy, PolicyId, PolicyUpdateRequest};
use crate::domain::repository::{PolicyRepository, RepositoryError};
use crate::domain::suppression::{ConstraintValidator, SuppressionList, ValidationOutcome, Violation};
use crate::infrastructure::event_bus::EventBus;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PolicyUpdateError {
    #[error("Suppressions for policy {policy_id} rejected with {} violation(s)", .violations.len())]
    Rejected {
        policy_id: PolicyId,
        violations: Vec<Violation>,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[async_trait]
pub trait PolicyService: Send + Sync {
    /// Validate and store a new suppression list as the next policy version
    async fn update_suppressions(
        &self,
        policy_id: PolicyId,
        request: PolicyUpdateRequest,
    ) -> Result<Policy, PolicyUpdateError>;

    async fn get_policy(&self, policy_id: &PolicyId) -> Result<Option<Policy>, PolicyUpdateError>;
}

pub struct StandardPolicyService {
    validator: ConstraintValidator,
    repository: Arc<dyn PolicyRepository>,
    event_bus: Arc<EventBus>,
}

impl StandardPolicyService {
    pub fn new(
        validator: ConstraintValidator,
        repository: Arc<dyn PolicyRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self { validator, repository, event_bus }
    }
}

#[async_trait]
impl PolicyService for StandardPolicyService {
    async fn update_suppressions(
        &self,
        policy_id: PolicyId,
        request: PolicyUpdateRequest,
    ) -> Result<Policy, PolicyUpdateError> {
        if let ValidationOutcome::Invalid(violations) = self.validator.validate(&request.suppressions) {
            warn!(
                "Rejected suppressions for policy {}: {} violation(s)",
                policy_id,
                violations.len()
            );
            self.event_bus.publish_policy_event(PolicyEvent::SuppressionsRejected {
                policy_id: policy_id.clone(),
                violations: violations.clone(),
                rejected_at: Utc::now(),
            });
            return Err(PolicyUpdateError::Rejected { policy_id, violations });
        }

        let suppressions = SuppressionList::new(request.suppressions);
        let policy = match self.repository.find_latest(&policy_id).await? {
            Some(current) => current.supersede(suppressions, request.user_id),
            None => Policy::first(policy_id, suppressions, request.user_id),
        };

        self.repository.save_version(&policy).await?;
        info!(
            "Policy {} now at version {} with {} suppression(s)",
            policy.id,
            policy.version,
            policy.suppressions.len()
        );

        self.event_bus.publish_policy_event(PolicyEvent::SuppressionsUpdated {
            policy_id: policy.id.clone(),
            version: policy.version,
            suppression_count: policy.suppressions.len(),
            updated_at: policy.updated_at,
        });

        Ok(policy)
    }

    async fn get_policy(&self, policy_id: &PolicyId) -> Result<Option<Policy>, PolicyUpdateError> {
        Ok(self.repository.find_latest(policy_id).await?)
    }
}
