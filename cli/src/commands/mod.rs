// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for Vigil CLI

pub mod config;
pub mod deploy;
pub mod suppressions;

pub use self::config::ConfigCommand;
pub use self::deploy::DeployCommand;
pub use self::suppressions::SuppressionsCommand;

use thiserror::Error;
use vigil_core::domain::deployment::DeploymentStep;

/// Command outcomes that map to a specific process exit code
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error("Deployment cancelled before step '{next}'")]
    Cancelled { next: DeploymentStep },

    #[error("Deployment failed at step '{step}'")]
    DeploymentFailed { step: DeploymentStep },

    #[error("Suppression list is invalid ({violations} violation(s))")]
    InvalidSuppressions { violations: usize },
}

impl CommandFailure {
    pub fn exit_code(&self) -> i32 {
        match self {
            // Conventional 128 + SIGINT
            CommandFailure::Cancelled { .. } => 130,
            CommandFailure::DeploymentFailed { .. } => 1,
            CommandFailure::InvalidSuppressions { .. } => 2,
        }
    }
}

/// Exit code for an error returned by a command handler
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CommandFailure>()
        .map(CommandFailure::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let cancelled = anyhow::Error::new(CommandFailure::Cancelled {
            next: DeploymentStep::GenerateMetrics,
        });
        assert_eq!(exit_code(&cancelled), 130);

        let failed: anyhow::Result<()> = Err(CommandFailure::DeploymentFailed {
            step: DeploymentStep::ApplyTemplate,
        }
        .into());
        let failed = failed.context("vigil deploy monitoring").unwrap_err();
        assert_eq!(exit_code(&failed), 1);

        assert_eq!(exit_code(&anyhow::anyhow!("config missing")), 1);
        assert_eq!(
            exit_code(&CommandFailure::InvalidSuppressions { violations: 3 }.into()),
            2
        );
    }
}
