// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Template Appliers
//!
//! - [`CloudFormationCliApplier`] shells out to `aws cloudformation deploy`.
//!   Credentials and session handling are left to the CLI's own provider
//!   chain. `--no-fail-on-empty-changeset` makes re-applying an unchanged
//!   template succeed as a no-op. On unix the CLI runs in its own process
//!   group, so an interrupt aimed at the caller does not abort a deploy that
//!   is already under way.
//! - [`DryRunTemplateApplier`] records applications without contacting a
//!   provider.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements the `TemplateApplier` port

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::deployment::{ApplicationError, TemplateApplication};
use crate::domain::monitoring::TemplateApplier;

pub struct CloudFormationCliApplier {
    aws_cli: PathBuf,
    capabilities: Vec<String>,
}

impl CloudFormationCliApplier {
    /// Use the `aws` binary found on `PATH`
    pub fn from_path() -> Result<Self, ApplicationError> {
        let aws_cli = which::which("aws")
            .map_err(|e| ApplicationError::CommandUnavailable(format!("aws: {}", e)))?;
        Ok(Self::with_cli(aws_cli))
    }

    pub fn with_cli(aws_cli: impl Into<PathBuf>) -> Self {
        Self {
            aws_cli: aws_cli.into(),
            capabilities: vec!["CAPABILITY_IAM".to_string(), "CAPABILITY_NAMED_IAM".to_string()],
        }
    }

    pub fn aws_cli(&self) -> &Path {
        &self.aws_cli
    }

    /// Arguments passed to the aws CLI for `application`
    pub fn deploy_args(&self, application: &TemplateApplication) -> Vec<String> {
        let mut args = vec![
            "cloudformation".to_string(),
            "deploy".to_string(),
            "--template-file".to_string(),
            application.template.display().to_string(),
            "--s3-bucket".to_string(),
            application.bucket.clone(),
            "--stack-name".to_string(),
            application.stack_name.clone(),
            "--region".to_string(),
            application.region.clone(),
            "--capabilities".to_string(),
        ];
        args.extend(self.capabilities.iter().cloned());
        args.push("--no-fail-on-empty-changeset".to_string());

        if !application.parameters.is_empty() {
            args.push("--parameter-overrides".to_string());
            args.extend(application.parameters.to_overrides());
        }
        args
    }
}

#[async_trait]
impl TemplateApplier for CloudFormationCliApplier {
    async fn apply_template(&self, application: TemplateApplication) -> Result<(), ApplicationError> {
        if !tokio::fs::try_exists(&application.template).await.unwrap_or(false) {
            return Err(ApplicationError::TemplateNotFound(application.template.clone()));
        }

        let args = self.deploy_args(&application);
        info!(
            "Applying {} to stack {} in {}",
            application.template.display(),
            application.stack_name,
            application.region
        );
        debug!("Running {} {}", self.aws_cli.display(), args.join(" "));

        let mut command = Command::new(&self.aws_cli);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Keep a terminal Ctrl-C away from an in-flight deploy; the pipeline
        // observes cancellation once this step returns.
        #[cfg(unix)]
        command.process_group(0);

        let output = command.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("Stack {} failed to deploy: {}", application.stack_name, stderr);
            return Err(ApplicationError::Provider {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}

/// Applier that only records what would have been applied
#[derive(Clone, Default)]
pub struct DryRunTemplateApplier {
    applied: Arc<Mutex<Vec<TemplateApplication>>>,
}

impl DryRunTemplateApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applications recorded so far, in call order
    pub fn applied(&self) -> Vec<TemplateApplication> {
        self.applied
            .lock()
            .map(|applied| applied.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TemplateApplier for DryRunTemplateApplier {
    async fn apply_template(&self, application: TemplateApplication) -> Result<(), ApplicationError> {
        info!(
            "[dry-run] Would apply {} to stack {} in {} (bucket {}, {} parameter(s))",
            application.template.display(),
            application.stack_name,
            application.region,
            application.bucket,
            application.parameters.len()
        );
        if let Ok(mut applied) = self.applied.lock() {
            applied.push(application);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deployment::StackParameters;

    fn application(parameters: StackParameters) -> TemplateApplication {
        TemplateApplication {
            template: PathBuf::from("deployments/monitoring.yml"),
            bucket: "vigil-artifacts".to_string(),
            stack_name: "app-monitoring".to_string(),
            region: "us-east-1".to_string(),
            parameters,
        }
    }

    #[test]
    fn test_deploy_args_without_parameters() {
        let applier = CloudFormationCliApplier::with_cli("/usr/local/bin/aws");
        let args = applier.deploy_args(&application(StackParameters::new()));

        assert_eq!(&args[..2], &["cloudformation", "deploy"]);
        assert!(args.contains(&"--no-fail-on-empty-changeset".to_string()));
        assert!(!args.contains(&"--parameter-overrides".to_string()));
        let stack = args.iter().position(|a| a == "--stack-name").unwrap();
        assert_eq!(args[stack + 1], "app-monitoring");
    }

    #[test]
    fn test_deploy_args_with_parameters() {
        let applier = CloudFormationCliApplier::with_cli("aws");
        let params = StackParameters::new().with("Debug", "true").with("ApiId", "abc123");
        let args = applier.deploy_args(&application(params));

        let overrides = args.iter().position(|a| a == "--parameter-overrides").unwrap();
        assert_eq!(&args[overrides + 1..], &["ApiId=abc123", "Debug=true"]);
    }

    #[tokio::test]
    async fn test_missing_template_is_reported_before_running() {
        let applier = CloudFormationCliApplier::with_cli("/nonexistent/aws");
        let mut app = application(StackParameters::new());
        app.template = PathBuf::from("/nonexistent/monitoring.yml");

        let err = applier.apply_template(app).await.unwrap_err();
        assert!(matches!(err, ApplicationError::TemplateNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provider_failure_carries_status() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("monitoring.yml");
        std::fs::write(&template, "Resources: {}\n").unwrap();

        // `false` ignores its arguments and exits 1
        let applier = CloudFormationCliApplier::with_cli("false");
        let mut app = application(StackParameters::new());
        app.template = template;

        let err = applier.apply_template(app).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Provider { status: 1, .. }));
    }

    #[tokio::test]
    async fn test_dry_run_records_applications() {
        let applier = DryRunTemplateApplier::new();
        applier
            .apply_template(application(StackParameters::new().with("Debug", "false")))
            .await
            .unwrap();

        let applied = applier.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].parameters.get("Debug"), Some("false"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_cli_runs_in_own_process_group() {
        use std::os::unix::fs::PermissionsExt;

        fn pgid(stat: &str) -> String {
            // Fields after the parenthesised command name: state, ppid, pgrp
            let after_comm = &stat[stat.rfind(')').unwrap() + 2..];
            after_comm.split_whitespace().nth(2).unwrap().to_string()
        }

        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("monitoring.yml");
        std::fs::write(&template, "Resources: {}\n").unwrap();

        let recorded = dir.path().join("child.stat");
        let cli = dir.path().join("aws");
        std::fs::write(&cli, format!("#!/bin/sh\ncat /proc/$$/stat > {}\n", recorded.display())).unwrap();
        std::fs::set_permissions(&cli, std::fs::Permissions::from_mode(0o755)).unwrap();

        let applier = CloudFormationCliApplier::with_cli(&cli);
        let mut app = application(StackParameters::new());
        app.template = template;
        applier.apply_template(app).await.unwrap();

        let child = pgid(&std::fs::read_to_string(&recorded).unwrap());
        let own = pgid(&std::fs::read_to_string("/proc/self/stat").unwrap());
        assert_ne!(child, own);
    }
}
