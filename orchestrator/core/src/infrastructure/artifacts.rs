// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! File-based monitoring artifact generators
//!
//! Each generator renders its definitions as pretty-printed JSON under the
//! configured artifact directory, where the monitoring template picks them up:
//!
//! ```text
//! <artifact_dir>/
//! ├── dashboards/<stack>-<region>.json
//! ├── metrics/<function>-errors.json
//! └── alarms/<alarm-name>.json
//! ```
//!
//! Each generator clears its own subdirectory before writing, so the directory
//! holds exactly the definitions of the latest run. Definitions removed from
//! configuration do not survive a re-generation.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements the `DashboardGenerator`, `MetricGenerator` and
//!   `AlarmGenerator` ports

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::deployment::{ArtifactKind, GeneratedArtifact, GenerationError, StackOutputs};
use crate::domain::monitoring::{
    AlarmDefinition, AlarmGenerator, ComparisonOperator, DashboardDefinition, DashboardGenerator,
    MetricFilterDefinition, MetricGenerator, MonitoredFunction, OutputAlarm,
};

const PERIOD_SECONDS: u32 = 300;
const WIDGET_WIDTH: u32 = 8;
const WIDGET_HEIGHT: u32 = 6;

/// Error-level lines in either JSON-structured or plain-text Lambda logs
const ERROR_FILTER_PATTERN: &str = r#"{ ($.level = "error") || ($.level = "ERROR") }"#;

async fn write_definition<T: Serialize>(
    dir: &Path,
    kind: ArtifactKind,
    name: &str,
    definition: &T,
) -> Result<GeneratedArtifact, GenerationError> {
    tokio::fs::create_dir_all(dir).await?;
    let location = dir.join(format!("{}.json", name));
    let body = serde_json::to_vec_pretty(definition)?;
    tokio::fs::write(&location, body).await?;
    debug!("Wrote {:?} artifact {} to {:?}", kind, name, location);
    Ok(GeneratedArtifact {
        kind,
        name: name.to_string(),
        location,
    })
}

/// Remove the definitions of a previous run
async fn reset_dir(dir: &Path) -> Result<(), GenerationError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn error_metric_name(function: &MonitoredFunction) -> String {
    format!("{}-Errors", function.name)
}

/// Renders one CloudWatch dashboard per region
pub struct FileDashboardGenerator {
    output_dir: PathBuf,
    dashboard_prefix: String,
    functions: Vec<MonitoredFunction>,
}

impl FileDashboardGenerator {
    pub fn new(artifact_dir: impl AsRef<Path>, dashboard_prefix: impl Into<String>, functions: Vec<MonitoredFunction>) -> Self {
        Self {
            output_dir: artifact_dir.as_ref().join("dashboards"),
            dashboard_prefix: dashboard_prefix.into(),
            functions,
        }
    }

    fn definition(&self, region: &str) -> DashboardDefinition {
        let mut widgets = Vec::with_capacity(self.functions.len() * 3);
        for (row, function) in self.functions.iter().enumerate() {
            let y = row as u32 * WIDGET_HEIGHT;
            for (column, (metric, stat)) in [("Invocations", "Sum"), ("Errors", "Sum"), ("Duration", "p99")]
                .iter()
                .enumerate()
            {
                widgets.push(json!({
                    "type": "metric",
                    "x": column as u32 * WIDGET_WIDTH,
                    "y": y,
                    "width": WIDGET_WIDTH,
                    "height": WIDGET_HEIGHT,
                    "properties": {
                        "title": format!("{} {}", function.name, metric),
                        "region": region,
                        "view": "timeSeries",
                        "stat": stat,
                        "period": PERIOD_SECONDS,
                        "metrics": [["AWS/Lambda", metric, "FunctionName", function.name]],
                    }
                }));
            }
        }

        DashboardDefinition {
            dashboard_name: format!("{}-{}", self.dashboard_prefix, region),
            region: region.to_string(),
            dashboard_body: json!({ "widgets": widgets }),
        }
    }
}

#[async_trait]
impl DashboardGenerator for FileDashboardGenerator {
    async fn generate_dashboards(&self, region: &str) -> Result<Vec<GeneratedArtifact>, GenerationError> {
        if region.trim().is_empty() {
            return Err(GenerationError::InvalidInput("region cannot be empty".to_string()));
        }
        let definition = self.definition(region);
        reset_dir(&self.output_dir).await?;
        let artifact = write_definition(
            &self.output_dir,
            ArtifactKind::Dashboard,
            &definition.dashboard_name,
            &definition,
        )
        .await?;
        Ok(vec![artifact])
    }
}

/// Renders one error-counting metric filter per monitored function
pub struct FileMetricGenerator {
    output_dir: PathBuf,
    namespace: String,
    functions: Vec<MonitoredFunction>,
}

impl FileMetricGenerator {
    pub fn new(artifact_dir: impl AsRef<Path>, namespace: impl Into<String>, functions: Vec<MonitoredFunction>) -> Self {
        Self {
            output_dir: artifact_dir.as_ref().join("metrics"),
            namespace: namespace.into(),
            functions,
        }
    }
}

#[async_trait]
impl MetricGenerator for FileMetricGenerator {
    async fn generate_metrics(&self) -> Result<Vec<GeneratedArtifact>, GenerationError> {
        reset_dir(&self.output_dir).await?;
        let mut artifacts = Vec::with_capacity(self.functions.len());
        for function in &self.functions {
            let definition = MetricFilterDefinition {
                filter_name: format!("{}-errors", function.name),
                log_group_name: function.log_group(),
                filter_pattern: ERROR_FILTER_PATTERN.to_string(),
                metric_namespace: self.namespace.clone(),
                metric_name: error_metric_name(function),
                metric_value: "1".to_string(),
            };
            artifacts.push(
                write_definition(&self.output_dir, ArtifactKind::MetricFilter, &definition.filter_name, &definition)
                    .await?,
            );
        }
        Ok(artifacts)
    }
}

/// Renders function alarms and alarms on resources of prior stacks
pub struct FileAlarmGenerator {
    output_dir: PathBuf,
    namespace: String,
    functions: Vec<MonitoredFunction>,
    output_alarms: Vec<OutputAlarm>,
}

impl FileAlarmGenerator {
    pub fn new(
        artifact_dir: impl AsRef<Path>,
        namespace: impl Into<String>,
        functions: Vec<MonitoredFunction>,
        output_alarms: Vec<OutputAlarm>,
    ) -> Self {
        Self {
            output_dir: artifact_dir.as_ref().join("alarms"),
            namespace: namespace.into(),
            functions,
            output_alarms,
        }
    }

    fn alarm(name: String, description: String, namespace: &str, metric: &str, threshold: f64, topic_arn: &str) -> AlarmDefinition {
        AlarmDefinition {
            alarm_name: name,
            alarm_description: description,
            namespace: namespace.to_string(),
            metric_name: metric.to_string(),
            statistic: "Sum".to_string(),
            period: PERIOD_SECONDS,
            evaluation_periods: 1,
            threshold,
            comparison_operator: ComparisonOperator::GreaterThanOrEqualToThreshold,
            treat_missing_data: "notBreaching".to_string(),
            alarm_actions: vec![topic_arn.to_string()],
            dimensions: BTreeMap::new(),
        }
    }

    /// Build every alarm definition; fails before anything is written.
    ///
    /// Alarm names double as file names and must be unique.
    fn definitions(&self, topic_arn: &str, prior_outputs: &StackOutputs) -> Result<Vec<AlarmDefinition>, GenerationError> {
        let mut alarms = Vec::new();

        for function in &self.functions {
            let mut lambda_errors = Self::alarm(
                format!("{}-lambda-errors", function.name),
                format!("Invocation errors in {}", function.name),
                "AWS/Lambda",
                "Errors",
                1.0,
                topic_arn,
            );
            lambda_errors
                .dimensions
                .insert("FunctionName".to_string(), function.name.clone());
            alarms.push(lambda_errors);

            alarms.push(Self::alarm(
                format!("{}-application-errors", function.name),
                format!("Error-level log lines in {}", function.log_group()),
                &self.namespace,
                &error_metric_name(function),
                1.0,
                topic_arn,
            ));
        }

        for output_alarm in &self.output_alarms {
            let resource = prior_outputs
                .get(&output_alarm.output)
                .ok_or_else(|| GenerationError::MissingOutput(output_alarm.output.clone()))?;
            let mut alarm = Self::alarm(
                format!("{}-{}", output_alarm.output, output_alarm.metric_name),
                format!("{} on {} {}", output_alarm.metric_name, output_alarm.dimension, resource),
                &output_alarm.namespace,
                &output_alarm.metric_name,
                output_alarm.threshold,
                topic_arn,
            );
            alarm
                .dimensions
                .insert(output_alarm.dimension.clone(), resource.clone());
            alarms.push(alarm);
        }

        let mut names = HashSet::with_capacity(alarms.len());
        for alarm in &alarms {
            if !names.insert(alarm.alarm_name.as_str()) {
                return Err(GenerationError::InvalidInput(format!(
                    "alarm name '{}' is generated more than once",
                    alarm.alarm_name
                )));
            }
        }

        Ok(alarms)
    }
}

#[async_trait]
impl AlarmGenerator for FileAlarmGenerator {
    async fn generate_alarms(
        &self,
        topic_arn: &str,
        prior_outputs: &StackOutputs,
    ) -> Result<Vec<GeneratedArtifact>, GenerationError> {
        if !topic_arn.starts_with("arn:") {
            return Err(GenerationError::InvalidInput(format!(
                "alarm topic must be an ARN, got '{}'",
                topic_arn
            )));
        }

        let definitions = self.definitions(topic_arn, prior_outputs)?;
        reset_dir(&self.output_dir).await?;
        let mut artifacts = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            artifacts.push(
                write_definition(&self.output_dir, ArtifactKind::Alarm, &definition.alarm_name, definition).await?,
            );
        }
        Ok(artifacts)
    }
}
