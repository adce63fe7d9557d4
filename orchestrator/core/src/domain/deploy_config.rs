// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Deployer Configuration Types
//
// Defines the configuration schema for the Vigil deployer, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Target account settings (region, artifact bucket, aws CLI location)
// - Monitoring stack settings (stack name, template, monitored functions)
// - Stack parameter assembly (static values and prior-stack outputs)
// - Suppression list limits

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::deployment::{ParameterSpec, TemplateTarget, MONITORING_STACK, MONITORING_TEMPLATE};
use crate::domain::monitoring::{MonitoredFunction, OutputAlarm};
use crate::domain::suppression::SuppressionLimits;

pub const API_VERSION: &str = "vigil.dev/v1";
pub const KIND: &str = "DeployConfig";

/// Top-level Kubernetes-style deployer configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfigManifest {
    /// API version (must be "vigil.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "DeployConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: DeployConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfigSpec {
    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub monitoring: MonitoringConfig,

    #[serde(default)]
    pub suppressions: SuppressionLimits,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Target region (e.g. "us-east-1")
    #[serde(default)]
    pub region: String,

    /// Bucket the template artifacts are uploaded to
    #[serde(default)]
    pub bucket: String,

    /// Explicit path to the aws CLI (default: looked up on PATH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_stack_name")]
    pub stack_name: String,

    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Directory generated dashboards, metric filters and alarms are written to
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// SNS topic alarms notify
    #[serde(default)]
    pub alarm_topic_arn: String,

    /// Namespace of generated custom metrics
    #[serde(default = "default_metric_namespace")]
    pub metric_namespace: String,

    #[serde(default)]
    pub functions: Vec<MonitoredFunction>,

    /// Alarms on resources created by previously deployed stacks
    #[serde(default)]
    pub output_alarms: Vec<OutputAlarm>,

    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Parameter name → prior-stack output key
    #[serde(default)]
    pub parameter_outputs: BTreeMap<String, String>,

    /// JSON or YAML file holding outputs of previously deployed stacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_outputs_file: Option<PathBuf>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stack_name: default_stack_name(),
            template: default_template(),
            artifact_dir: default_artifact_dir(),
            alarm_topic_arn: String::new(),
            metric_namespace: default_metric_namespace(),
            functions: vec![],
            output_alarms: vec![],
            parameters: BTreeMap::new(),
            parameter_outputs: BTreeMap::new(),
            prior_outputs_file: None,
        }
    }
}

impl MonitoringConfig {
    pub fn parameter_spec(&self) -> ParameterSpec {
        ParameterSpec {
            values: self.parameters.clone(),
            from_outputs: self.parameter_outputs.clone(),
        }
    }
}

fn default_stack_name() -> String {
    MONITORING_STACK.to_string()
}

fn default_template() -> PathBuf {
    PathBuf::from(MONITORING_TEMPLATE)
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("out/deployments/monitoring")
}

fn default_metric_namespace() -> String {
    "Vigil".to_string()
}

impl Default for DeployConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "vigil".to_string(),
                labels: None,
            },
            spec: DeployConfigSpec::default(),
        }
    }
}

impl DeployConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. VIGIL_CONFIG_PATH environment variable
    /// 2. ./vigil-config.yaml (working directory)
    /// 3. ~/.vigil/config.yaml (user home)
    /// 4. /etc/vigil/config.yaml (system, Unix) or C:\ProgramData\Vigil\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VIGIL_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./vigil-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vigil").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/vigil/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Vigil\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// `VIGIL_REGION` takes precedence over `AWS_REGION`.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = non_empty("VIGIL_REGION").or_else(|| non_empty("AWS_REGION")) {
            tracing::info!("Environment override: region={}", region);
            self.spec.aws.region = region;
        }

        if let Some(bucket) = non_empty("VIGIL_BUCKET") {
            tracing::info!("Environment override: VIGIL_BUCKET={}", bucket);
            self.spec.aws.bucket = bucket;
        }

        if let Some(topic) = non_empty("VIGIL_ALARM_TOPIC_ARN") {
            tracing::info!("Environment override: VIGIL_ALARM_TOPIC_ARN={}", topic);
            self.spec.monitoring.alarm_topic_arn = topic;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let monitoring = &self.spec.monitoring;
        if monitoring.stack_name.is_empty() {
            anyhow::bail!("spec.monitoring.stack_name cannot be empty");
        }

        if !monitoring.alarm_topic_arn.is_empty() && !monitoring.alarm_topic_arn.starts_with("arn:") {
            anyhow::bail!(
                "spec.monitoring.alarm_topic_arn must be an ARN, got '{}'",
                monitoring.alarm_topic_arn
            );
        }

        for function in &monitoring.functions {
            if function.name.is_empty() {
                anyhow::bail!("Monitored function name cannot be empty");
            }
        }

        if self.spec.suppressions.max_items == 0 {
            anyhow::bail!("spec.suppressions.max_items must be greater than zero");
        }

        if self.spec.suppressions.max_pattern_length == 0 {
            anyhow::bail!("spec.suppressions.max_pattern_length must be greater than zero");
        }

        Ok(())
    }

    /// Validate the settings a monitoring deployment cannot run without
    pub fn validate_for_deployment(&self) -> anyhow::Result<()> {
        self.validate()?;

        if self.spec.aws.region.is_empty() {
            anyhow::bail!("spec.aws.region is required for deployment (or set VIGIL_REGION)");
        }

        if self.spec.aws.bucket.is_empty() {
            anyhow::bail!("spec.aws.bucket is required for deployment (or set VIGIL_BUCKET)");
        }

        if self.spec.monitoring.alarm_topic_arn.is_empty() {
            anyhow::bail!(
                "spec.monitoring.alarm_topic_arn is required for deployment (or set VIGIL_ALARM_TOPIC_ARN)"
            );
        }

        Ok(())
    }

    pub fn template_target(&self) -> TemplateTarget {
        TemplateTarget {
            template: self.spec.monitoring.template.clone(),
            bucket: self.spec.aws.bucket.clone(),
            stack_name: self.spec.monitoring.stack_name.clone(),
        }
    }
}
