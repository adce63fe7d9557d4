// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Monitoring Deployment Domain
//!
//! Types shared by the deploy-monitoring pipeline: the per-invocation
//! [`DeploymentContext`], the [`StackParameters`] handed to the template
//! applier, the fixed [`DeploymentStep`] sequence, and the error taxonomy.
//!
//! ## Pipeline
//!
//! ```text
//! Start → GenerateDashboards → GenerateMetrics → GenerateAlarms → ApplyTemplate → Done
//!            └──────────────────────┴──────────────────┴────────────────┴──→ Failed
//! ```
//!
//! A failed step ends the invocation. Nothing is retried and side effects of
//! completed steps are left in place; the operator re-runs the deployment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Default name of the monitoring stack
pub const MONITORING_STACK: &str = "app-monitoring";

/// Default path of the monitoring template
pub const MONITORING_TEMPLATE: &str = "deployments/monitoring.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(pub Uuid);

impl DeploymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outputs of previously deployed stacks, keyed by output name
pub type StackOutputs = BTreeMap<String, String>;

/// Read-only environment facts for one deployment invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentContext {
    pub region: String,
    pub alarm_topic_arn: String,
    #[serde(default)]
    pub prior_outputs: StackOutputs,
}

impl DeploymentContext {
    pub fn new(region: impl Into<String>, alarm_topic_arn: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            alarm_topic_arn: alarm_topic_arn.into(),
            prior_outputs: StackOutputs::new(),
        }
    }

    pub fn with_prior_outputs(mut self, outputs: StackOutputs) -> Self {
        self.prior_outputs = outputs;
        self
    }

    pub fn with_prior_output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.prior_outputs.insert(key.into(), value.into());
        self
    }
}

/// Parameter overrides for one template application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackParameters(BTreeMap<String, String>);

impl StackParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// `Key=Value` pairs in key order, as accepted by `--parameter-overrides`
    pub fn to_overrides(&self) -> Vec<String> {
        self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }
}

impl FromIterator<(String, String)> for StackParameters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How the parameters of the monitoring stack are assembled
///
/// `values` are passed through as-is. `from_outputs` maps a parameter name to
/// the prior-stack output key whose value it takes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(default)]
    pub values: BTreeMap<String, String>,

    #[serde(default)]
    pub from_outputs: BTreeMap<String, String>,
}

impl ParameterSpec {
    /// Build a fresh parameter mapping for one invocation.
    pub fn resolve(&self, outputs: &StackOutputs) -> Result<StackParameters, ApplicationError> {
        let mut resolved: BTreeMap<String, String> = self.values.clone();
        for (parameter, output_key) in &self.from_outputs {
            let value = outputs.get(output_key).ok_or_else(|| {
                ApplicationError::UnresolvedParameter {
                    parameter: parameter.clone(),
                    output: output_key.clone(),
                }
            })?;
            resolved.insert(parameter.clone(), value.clone());
        }
        Ok(StackParameters(resolved))
    }
}

/// Where and as what the monitoring template is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTarget {
    pub template: PathBuf,
    pub bucket: String,
    pub stack_name: String,
}

impl TemplateTarget {
    pub fn monitoring(bucket: impl Into<String>) -> Self {
        Self {
            template: PathBuf::from(MONITORING_TEMPLATE),
            bucket: bucket.into(),
            stack_name: MONITORING_STACK.to_string(),
        }
    }
}

/// Everything the template applier needs for one apply-or-update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateApplication {
    pub template: PathBuf,
    pub bucket: String,
    pub stack_name: String,
    pub region: String,
    pub parameters: StackParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStep {
    GenerateDashboards,
    GenerateMetrics,
    GenerateAlarms,
    ApplyTemplate,
}

impl DeploymentStep {
    /// Execution order of the monitoring pipeline
    pub const ALL: [DeploymentStep; 4] = [
        DeploymentStep::GenerateDashboards,
        DeploymentStep::GenerateMetrics,
        DeploymentStep::GenerateAlarms,
        DeploymentStep::ApplyTemplate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStep::GenerateDashboards => "generate_dashboards",
            DeploymentStep::GenerateMetrics => "generate_metrics",
            DeploymentStep::GenerateAlarms => "generate_alarms",
            DeploymentStep::ApplyTemplate => "apply_template",
        }
    }
}

impl fmt::Display for DeploymentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Dashboard,
    MetricFilter,
    Alarm,
}

/// Reference to an artifact a generator produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub location: PathBuf,
}

/// Summary of a successful deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub deployment_id: DeploymentId,
    pub stack_name: String,
    pub completed_steps: Vec<DeploymentStep>,
    pub artifacts: Vec<GeneratedArtifact>,
    pub parameters: StackParameters,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Required stack output '{0}' is missing")]
    MissingOutput(String),

    #[error("Invalid generator input: {0}")]
    InvalidInput(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Parameter '{parameter}' references missing stack output '{output}'")]
    UnresolvedParameter { parameter: String, output: String },

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Provider command not available: {0}")]
    CommandUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider exited with status {status}: {stderr}")]
    Provider { status: i32, stderr: String },
}

/// Terminal outcome of a failed or cancelled deployment invocation
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Deployment step '{step}' failed: {source}")]
    Generation {
        step: DeploymentStep,
        #[source]
        source: GenerationError,
    },

    #[error("Deployment step 'apply_template' failed for stack '{stack}': {source}")]
    Application {
        stack: String,
        #[source]
        source: ApplicationError,
    },

    #[error("Deployment cancelled before step '{next}'")]
    Cancelled {
        next: DeploymentStep,
        completed: Vec<DeploymentStep>,
    },
}

impl DeploymentError {
    /// The step that failed, or the step that was about to start when cancelled
    pub fn step(&self) -> DeploymentStep {
        match self {
            DeploymentError::Generation { step, .. } => *step,
            DeploymentError::Application { .. } => DeploymentStep::ApplyTemplate,
            DeploymentError::Cancelled { next, .. } => *next,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeploymentError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() {
        let names: Vec<_> = DeploymentStep::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["generate_dashboards", "generate_metrics", "generate_alarms", "apply_template"]
        );
    }

    #[test]
    fn test_context_builder() {
        let ctx = DeploymentContext::new("us-east-1", "arn:aws:sns:us-east-1:123456789012:alarms")
            .with_prior_output("GraphQLApiId", "abc123")
            .with_prior_output("GraphQLApiId", "def456");
        assert_eq!(ctx.region, "us-east-1");
        assert_eq!(ctx.prior_outputs.len(), 1);
        assert_eq!(ctx.prior_outputs["GraphQLApiId"], "def456");
    }

    #[test]
    fn test_parameter_spec_resolves_static_and_output_values() {
        let spec = ParameterSpec {
            values: BTreeMap::from([("Debug".to_string(), "false".to_string())]),
            from_outputs: BTreeMap::from([("ApiId".to_string(), "GraphQLApiId".to_string())]),
        };
        let outputs = StackOutputs::from([("GraphQLApiId".to_string(), "abc123".to_string())]);

        let params = spec.resolve(&outputs).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("Debug"), Some("false"));
        assert_eq!(params.get("ApiId"), Some("abc123"));
        assert_eq!(params.to_overrides(), vec!["ApiId=abc123", "Debug=false"]);
    }

    #[test]
    fn test_parameter_spec_missing_output() {
        let spec = ParameterSpec {
            values: BTreeMap::new(),
            from_outputs: BTreeMap::from([("ApiId".to_string(), "GraphQLApiId".to_string())]),
        };
        let err = spec.resolve(&StackOutputs::new()).unwrap_err();
        assert!(matches!(err, ApplicationError::UnresolvedParameter { ref output, .. } if output == "GraphQLApiId"));
    }

    #[test]
    fn test_empty_parameter_spec_yields_empty_parameters() {
        let params = ParameterSpec::default().resolve(&StackOutputs::new()).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_deployment_error_names_step() {
        let err = DeploymentError::Generation {
            step: DeploymentStep::GenerateMetrics,
            source: GenerationError::Provider("throttled".to_string()),
        };
        assert_eq!(err.step(), DeploymentStep::GenerateMetrics);
        let message = err.to_string();
        assert!(message.contains("generate_metrics"));
        assert!(message.contains("throttled"));

        let err = DeploymentError::Application {
            stack: MONITORING_STACK.to_string(),
            source: ApplicationError::Provider { status: 255, stderr: "denied".to_string() },
        };
        assert_eq!(err.step(), DeploymentStep::ApplyTemplate);
        assert!(err.to_string().contains("app-monitoring"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_template_target_defaults() {
        let target = TemplateTarget::monitoring("artifacts-bucket");
        assert_eq!(target.stack_name, "app-monitoring");
        assert_eq!(target.template, PathBuf::from("deployments/monitoring.yml"));
    }
}
