// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment commands
//!
//! Commands: monitoring

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use vigil_core::application::deploy_monitoring::{DeployMonitoringUseCase, StandardDeployMonitoringUseCase};
use vigil_core::domain::deploy_config::DeployConfigManifest;
use vigil_core::domain::deployment::{
    DeploymentContext, DeploymentError, DeploymentReport, DeploymentStep, StackOutputs,
};
use vigil_core::domain::events::DeploymentEvent;
use vigil_core::domain::monitoring::TemplateApplier;
use vigil_core::infrastructure::event_bus::{DeploymentEventReceiver, EventBus, EventBusError};
use vigil_core::infrastructure::stack_outputs::{describe_stack_outputs, load_outputs_file};
use vigil_core::infrastructure::{
    CloudFormationCliApplier, DryRunTemplateApplier, FileAlarmGenerator, FileDashboardGenerator,
    FileMetricGenerator,
};

use super::CommandFailure;

#[derive(Subcommand)]
pub enum DeployCommand {
    /// Generate monitoring artifacts and apply the monitoring stack
    Monitoring {
        /// Generate artifacts but only print the template application
        #[arg(long)]
        dry_run: bool,

        /// JSON or YAML map of prior stack outputs (overrides prior_outputs_file)
        #[arg(long, value_name = "FILE")]
        outputs: Option<PathBuf>,

        /// Read prior outputs from a deployed stack
        #[arg(long, value_name = "STACK")]
        outputs_from_stack: Option<String>,
    },
}

pub async fn handle_command(command: DeployCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        DeployCommand::Monitoring {
            dry_run,
            outputs,
            outputs_from_stack,
        } => monitoring(config_override, dry_run, outputs, outputs_from_stack).await,
    }
}

async fn monitoring(
    config_override: Option<PathBuf>,
    dry_run: bool,
    outputs: Option<PathBuf>,
    outputs_from_stack: Option<String>,
) -> Result<()> {
    let config = DeployConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate_for_deployment()
        .context("Configuration is incomplete")?;

    let cli_applier = if dry_run && outputs_from_stack.is_none() {
        None
    } else {
        Some(match &config.spec.aws.cli_path {
            Some(path) => CloudFormationCliApplier::with_cli(path),
            None => CloudFormationCliApplier::from_path().context("aws CLI not found on PATH")?,
        })
    };

    let outputs_file = outputs.or_else(|| config.spec.monitoring.prior_outputs_file.clone());
    let mut prior_outputs = match &outputs_file {
        Some(path) => load_outputs_file(path)?,
        None => StackOutputs::new(),
    };
    if let (Some(stack), Some(applier)) = (&outputs_from_stack, &cli_applier) {
        let described = describe_stack_outputs(applier.aws_cli(), stack, &config.spec.aws.region)
            .await
            .with_context(|| format!("Failed to read outputs of stack {}", stack))?;
        prior_outputs.extend(described);
    }

    let applier: Arc<dyn TemplateApplier> = match cli_applier {
        Some(applier) if !dry_run => Arc::new(applier),
        _ => Arc::new(DryRunTemplateApplier::new()),
    };

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let use_case = build_use_case(&config, applier, event_bus.clone());
    let ctx = DeploymentContext::new(
        config.spec.aws.region.clone(),
        config.spec.monitoring.alarm_topic_arn.clone(),
    )
    .with_prior_outputs(prior_outputs);

    println!(
        "Deploying {} to {}{}",
        use_case.target().stack_name.bold(),
        ctx.region,
        if dry_run { " (dry run)".dimmed().to_string() } else { String::new() }
    );

    let cancellation = CancellationToken::new();
    let interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            interrupt.cancel();
        }
    });

    let progress = tokio::spawn(print_progress(event_bus.subscribe_deployments()));
    let result = use_case.deploy_monitoring_with_cancellation(ctx, cancellation).await;
    let _ = progress.await;

    finish(result)
}

/// Wire the file generators and `applier` from configuration
pub fn build_use_case(
    config: &DeployConfigManifest,
    applier: Arc<dyn TemplateApplier>,
    event_bus: Arc<EventBus>,
) -> StandardDeployMonitoringUseCase {
    let monitoring = &config.spec.monitoring;
    let artifact_dir: &Path = &monitoring.artifact_dir;

    StandardDeployMonitoringUseCase::new(
        Arc::new(FileDashboardGenerator::new(
            artifact_dir,
            monitoring.stack_name.clone(),
            monitoring.functions.clone(),
        )),
        Arc::new(FileMetricGenerator::new(
            artifact_dir,
            monitoring.metric_namespace.clone(),
            monitoring.functions.clone(),
        )),
        Arc::new(FileAlarmGenerator::new(
            artifact_dir,
            monitoring.metric_namespace.clone(),
            monitoring.functions.clone(),
            monitoring.output_alarms.clone(),
        )),
        applier,
        event_bus,
        config.template_target(),
    )
    .with_parameters(monitoring.parameter_spec())
}

async fn print_progress(mut receiver: DeploymentEventReceiver) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(EventBusError::Lagged(_)) => continue,
            Err(_) => break,
        };
        match event {
            DeploymentEvent::StepStarted { step, .. } => println!("  {} {}", "→".cyan(), step),
            DeploymentEvent::StepCompleted { step, artifact_count, .. } => {
                println!("  {} {} ({} artifact(s))", "✓".green(), step, artifact_count)
            }
            DeploymentEvent::StepFailed { step, .. } => {
                println!("  {} {}", "✗".red(), step);
                break;
            }
            DeploymentEvent::DeploymentCancelled { .. } | DeploymentEvent::DeploymentCompleted { .. } => break,
            DeploymentEvent::DeploymentStarted { .. } => {}
        }
    }
}

fn finish(result: Result<DeploymentReport, DeploymentError>) -> Result<()> {
    match result {
        Ok(report) => {
            println!(
                "{}",
                format!(
                    "✓ Stack {} deployed ({} artifact(s), {} parameter(s))",
                    report.stack_name,
                    report.artifacts.len(),
                    report.parameters.len()
                )
                .green()
            );
            Ok(())
        }
        Err(DeploymentError::Cancelled { next, completed }) => {
            println!(
                "{}",
                format!(
                    "⚠ Cancelled after {} of {} step(s)",
                    completed.len(),
                    DeploymentStep::ALL.len()
                )
                .yellow()
            );
            Err(CommandFailure::Cancelled { next }.into())
        }
        Err(err) => {
            let step = err.step();
            Err(anyhow::Error::new(err).context(CommandFailure::DeploymentFailed { step }))
        }
    }
}
