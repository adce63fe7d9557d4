// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::deployment::{DeploymentId, DeploymentStep};
use crate::domain::policy::PolicyId;
use crate::domain::suppression::Violation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeploymentEvent {
    DeploymentStarted {
        deployment_id: DeploymentId,
        stack_name: String,
        region: String,
        started_at: DateTime<Utc>,
    },
    StepStarted {
        deployment_id: DeploymentId,
        step: DeploymentStep,
        started_at: DateTime<Utc>,
    },
    StepCompleted {
        deployment_id: DeploymentId,
        step: DeploymentStep,
        artifact_count: usize,
        completed_at: DateTime<Utc>,
    },
    StepFailed {
        deployment_id: DeploymentId,
        step: DeploymentStep,
        error: String,
        failed_at: DateTime<Utc>,
    },
    DeploymentCompleted {
        deployment_id: DeploymentId,
        stack_name: String,
        completed_at: DateTime<Utc>,
    },
    DeploymentCancelled {
        deployment_id: DeploymentId,
        next_step: DeploymentStep,
        cancelled_at: DateTime<Utc>,
    },
}

impl DeploymentEvent {
    pub fn deployment_id(&self) -> DeploymentId {
        match self {
            DeploymentEvent::DeploymentStarted { deployment_id, .. }
            | DeploymentEvent::StepStarted { deployment_id, .. }
            | DeploymentEvent::StepCompleted { deployment_id, .. }
            | DeploymentEvent::StepFailed { deployment_id, .. }
            | DeploymentEvent::DeploymentCompleted { deployment_id, .. }
            | DeploymentEvent::DeploymentCancelled { deployment_id, .. } => *deployment_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PolicyEvent {
    SuppressionsUpdated {
        policy_id: PolicyId,
        version: u32,
        suppression_count: usize,
        updated_at: DateTime<Utc>,
    },
    SuppressionsRejected {
        policy_id: PolicyId,
        violations: Vec<Violation>,
        rejected_at: DateTime<Utc>,
    },
}
