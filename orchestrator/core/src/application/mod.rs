// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod deploy_monitoring;
pub mod policy;

// Re-export use cases for convenience
pub use deploy_monitoring::{DeployMonitoringUseCase, StandardDeployMonitoringUseCase};
pub use policy::{PolicyService, PolicyUpdateError, StandardPolicyService};
