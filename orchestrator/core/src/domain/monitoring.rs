// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Monitoring Artifacts & Collaborator Ports
//!
//! Definitions of the artifacts the monitoring stack is built from, and the
//! traits the deployment pipeline calls to produce and apply them.
//!
//! | Port | Step | Implementations |
//! |------|------|-----------------|
//! | `DashboardGenerator` | `GenerateDashboards` | `FileDashboardGenerator` |
//! | `MetricGenerator` | `GenerateMetrics` | `FileMetricGenerator` |
//! | `AlarmGenerator` | `GenerateAlarms` | `FileAlarmGenerator` |
//! | `TemplateApplier` | `ApplyTemplate` | `CloudFormationCliApplier`, `DryRunTemplateApplier` |
//!
//! Generators own their retry and batching behaviour; the pipeline only looks
//! at the returned error.

use crate::domain::deployment::{
    ApplicationError, GeneratedArtifact, GenerationError, StackOutputs, TemplateApplication,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A function whose logs and metrics the monitoring stack covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredFunction {
    pub name: String,

    /// Log group override (default: `/aws/lambda/<name>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
}

impl MonitoredFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), log_group: None }
    }

    pub fn log_group(&self) -> String {
        self.log_group
            .clone()
            .unwrap_or_else(|| format!("/aws/lambda/{}", self.name))
    }
}

/// Alarm on a resource created by a previously deployed stack
///
/// The resource is identified by the value of `output` in the prior stack
/// outputs, used as the `dimension` of the alarmed metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputAlarm {
    pub output: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimension: String,
    #[serde(default = "default_output_alarm_threshold")]
    pub threshold: f64,
}

fn default_output_alarm_threshold() -> f64 {
    1.0
}

/// CloudWatch dashboard definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DashboardDefinition {
    pub dashboard_name: String,
    pub region: String,
    pub dashboard_body: Value,
}

/// Log metric filter definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricFilterDefinition {
    pub filter_name: String,
    pub log_group_name: String,
    pub filter_pattern: String,
    pub metric_namespace: String,
    pub metric_name: String,
    pub metric_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
}

/// Metric alarm definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmDefinition {
    pub alarm_name: String,
    pub alarm_description: String,
    pub namespace: String,
    pub metric_name: String,
    pub statistic: String,
    pub period: u32,
    pub evaluation_periods: u32,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: String,
    pub alarm_actions: Vec<String>,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

#[async_trait]
pub trait DashboardGenerator: Send + Sync {
    /// Produce the dashboards for `region`
    async fn generate_dashboards(&self, region: &str) -> Result<Vec<GeneratedArtifact>, GenerationError>;
}

#[async_trait]
pub trait MetricGenerator: Send + Sync {
    async fn generate_metrics(&self) -> Result<Vec<GeneratedArtifact>, GenerationError>;
}

#[async_trait]
pub trait AlarmGenerator: Send + Sync {
    /// Produce alarms notifying `topic_arn`, wired to resources in `prior_outputs`
    async fn generate_alarms(
        &self,
        topic_arn: &str,
        prior_outputs: &StackOutputs,
    ) -> Result<Vec<GeneratedArtifact>, GenerationError>;
}

#[async_trait]
pub trait TemplateApplier: Send + Sync {
    /// Create or update the stack. Re-applying an unchanged template is a no-op
    /// at the provider.
    async fn apply_template(&self, application: TemplateApplication) -> Result<(), ApplicationError>;
}
