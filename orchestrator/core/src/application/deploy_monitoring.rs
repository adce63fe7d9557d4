// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deploy Monitoring Use Case
//!
//! Application service that provisions the monitoring stack.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Sequence artifact generation and template application
//! - **Collaborators:**
//!   - Domain: `DashboardGenerator`, `MetricGenerator`, `AlarmGenerator`,
//!     `TemplateApplier` ports; `ParameterSpec`
//!   - Infrastructure: EventBus
//!
//! # Flow
//!
//! 1. Generate dashboards for the context region
//! 2. Generate metric filters
//! 3. Generate alarms wired to the alarm topic and prior stack outputs
//! 4. Resolve stack parameters and apply the monitoring template
//!
//! # Error Handling
//!
//! Fail-fast: the first failing step ends the invocation with a
//! `DeploymentError` naming that step. Later steps never start, nothing is
//! retried, and artifacts written by earlier steps are left in place.
//! Cancellation is observed between steps only.

use crate::domain::deployment::{
    DeploymentContext, DeploymentError, DeploymentId, DeploymentReport, DeploymentStep,
    GeneratedArtifact, GenerationError, ParameterSpec, TemplateApplication, TemplateTarget,
};
use crate::domain::events::DeploymentEvent;
use crate::domain::monitoring::{AlarmGenerator, DashboardGenerator, MetricGenerator, TemplateApplier};
use crate::infrastructure::event_bus::EventBus;
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[async_trait]
pub trait DeployMonitoringUseCase: Send + Sync {
    /// Deploy the monitoring stack, cancellable between steps
    ///
    /// # Errors
    ///
    /// - `Generation`: a generator failed; no later step ran
    /// - `Application`: parameters could not be resolved or the provider rejected the template
    /// - `Cancelled`: `cancellation` fired before the next step started
    async fn deploy_monitoring_with_cancellation(
        &self,
        ctx: DeploymentContext,
        cancellation: CancellationToken,
    ) -> Result<DeploymentReport, DeploymentError>;

    async fn deploy_monitoring(&self, ctx: DeploymentContext) -> Result<DeploymentReport, DeploymentError> {
        self.deploy_monitoring_with_cancellation(ctx, CancellationToken::new()).await
    }
}

/// Standard implementation of DeployMonitoringUseCase
pub struct StandardDeployMonitoringUseCase {
    dashboards: Arc<dyn DashboardGenerator>,
    metrics: Arc<dyn MetricGenerator>,
    alarms: Arc<dyn AlarmGenerator>,
    applier: Arc<dyn TemplateApplier>,
    event_bus: Arc<EventBus>,
    target: TemplateTarget,
    parameters: ParameterSpec,
}

impl StandardDeployMonitoringUseCase {
    pub fn new(
        dashboards: Arc<dyn DashboardGenerator>,
        metrics: Arc<dyn MetricGenerator>,
        alarms: Arc<dyn AlarmGenerator>,
        applier: Arc<dyn TemplateApplier>,
        event_bus: Arc<EventBus>,
        target: TemplateTarget,
    ) -> Self {
        Self {
            dashboards,
            metrics,
            alarms,
            applier,
            event_bus,
            target,
            parameters: ParameterSpec::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: ParameterSpec) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn target(&self) -> &TemplateTarget {
        &self.target
    }

    /// Run one generation step: cancellation check, events, and the generator itself
    async fn run_generation_step<F>(
        &self,
        deployment_id: DeploymentId,
        step: DeploymentStep,
        cancellation: &CancellationToken,
        completed: &mut Vec<DeploymentStep>,
        artifacts: &mut Vec<GeneratedArtifact>,
        generation: F,
    ) -> Result<(), DeploymentError>
    where
        F: Future<Output = Result<Vec<GeneratedArtifact>, GenerationError>>,
    {
        self.check_cancelled(deployment_id, cancellation, step, completed)?;
        self.event_bus.publish_deployment_event(DeploymentEvent::StepStarted {
            deployment_id,
            step,
            started_at: Utc::now(),
        });

        let generated = generation
            .await
            .map_err(|source| self.step_failed(deployment_id, DeploymentError::Generation { step, source }))?;

        info!("Step {} produced {} artifact(s)", step, generated.len());
        self.event_bus.publish_deployment_event(DeploymentEvent::StepCompleted {
            deployment_id,
            step,
            artifact_count: generated.len(),
            completed_at: Utc::now(),
        });
        artifacts.extend(generated);
        completed.push(step);
        Ok(())
    }

    fn step_failed(&self, deployment_id: DeploymentId, err: DeploymentError) -> DeploymentError {
        error!("Deployment {} failed at step {}: {}", deployment_id, err.step(), err);
        self.event_bus.publish_deployment_event(DeploymentEvent::StepFailed {
            deployment_id,
            step: err.step(),
            error: err.to_string(),
            failed_at: Utc::now(),
        });
        err
    }

    fn check_cancelled(
        &self,
        deployment_id: DeploymentId,
        cancellation: &CancellationToken,
        next: DeploymentStep,
        completed: &[DeploymentStep],
    ) -> Result<(), DeploymentError> {
        if !cancellation.is_cancelled() {
            return Ok(());
        }
        warn!("Deployment {} cancelled before step {}", deployment_id, next);
        self.event_bus.publish_deployment_event(DeploymentEvent::DeploymentCancelled {
            deployment_id,
            next_step: next,
            cancelled_at: Utc::now(),
        });
        Err(DeploymentError::Cancelled {
            next,
            completed: completed.to_vec(),
        })
    }
}

#[async_trait]
impl DeployMonitoringUseCase for StandardDeployMonitoringUseCase {
    async fn deploy_monitoring_with_cancellation(
        &self,
        ctx: DeploymentContext,
        cancellation: CancellationToken,
    ) -> Result<DeploymentReport, DeploymentError> {
        let deployment_id = DeploymentId::new();
        let started_at = Utc::now();
        info!(
            "Deploying monitoring stack {} to {} (deployment {})",
            self.target.stack_name, ctx.region, deployment_id
        );
        self.event_bus.publish_deployment_event(DeploymentEvent::DeploymentStarted {
            deployment_id,
            stack_name: self.target.stack_name.clone(),
            region: ctx.region.clone(),
            started_at,
        });

        let mut completed = Vec::with_capacity(DeploymentStep::ALL.len());
        let mut artifacts = Vec::new();

        // Steps 1-3: artifact generation. Futures are lazy, so a generator
        // only runs once its step has passed the cancellation check.
        self.run_generation_step(
            deployment_id,
            DeploymentStep::GenerateDashboards,
            &cancellation,
            &mut completed,
            &mut artifacts,
            self.dashboards.generate_dashboards(&ctx.region),
        )
        .await?;
        self.run_generation_step(
            deployment_id,
            DeploymentStep::GenerateMetrics,
            &cancellation,
            &mut completed,
            &mut artifacts,
            self.metrics.generate_metrics(),
        )
        .await?;
        self.run_generation_step(
            deployment_id,
            DeploymentStep::GenerateAlarms,
            &cancellation,
            &mut completed,
            &mut artifacts,
            self.alarms.generate_alarms(&ctx.alarm_topic_arn, &ctx.prior_outputs),
        )
        .await?;

        // Step 4: template application
        let step = DeploymentStep::ApplyTemplate;
        self.check_cancelled(deployment_id, &cancellation, step, &completed)?;
        self.event_bus.publish_deployment_event(DeploymentEvent::StepStarted {
            deployment_id,
            step,
            started_at: Utc::now(),
        });

        let application_failed = |source| {
            self.step_failed(
                deployment_id,
                DeploymentError::Application {
                    stack: self.target.stack_name.clone(),
                    source,
                },
            )
        };

        let parameters = self
            .parameters
            .resolve(&ctx.prior_outputs)
            .map_err(application_failed)?;

        self.applier
            .apply_template(TemplateApplication {
                template: self.target.template.clone(),
                bucket: self.target.bucket.clone(),
                stack_name: self.target.stack_name.clone(),
                region: ctx.region.clone(),
                parameters: parameters.clone(),
            })
            .await
            .map_err(application_failed)?;

        self.event_bus.publish_deployment_event(DeploymentEvent::StepCompleted {
            deployment_id,
            step,
            artifact_count: 0,
            completed_at: Utc::now(),
        });
        completed.push(step);

        let completed_at = Utc::now();
        info!("Monitoring stack {} deployed", self.target.stack_name);
        self.event_bus.publish_deployment_event(DeploymentEvent::DeploymentCompleted {
            deployment_id,
            stack_name: self.target.stack_name.clone(),
            completed_at,
        });

        Ok(DeploymentReport {
            deployment_id,
            stack_name: self.target.stack_name.clone(),
            completed_steps: completed,
            artifacts,
            parameters,
            started_at,
            completed_at,
        })
    }
}
