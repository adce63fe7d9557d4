// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prior stack outputs
//!
//! Outputs of previously deployed stacks come either from a file (a flat JSON
//! or YAML map) or from `aws cloudformation describe-stacks`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

use crate::domain::deployment::StackOutputs;

/// Read a flat `key: value` map. YAML parsing also accepts JSON.
pub fn load_outputs_file(path: impl AsRef<Path>) -> Result<StackOutputs> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stack outputs from {:?}", path))?;
    if content.trim().is_empty() {
        return Ok(StackOutputs::new());
    }
    let outputs: StackOutputs = serde_yaml::from_str(&content)
        .with_context(|| format!("Stack outputs in {:?} must be a map of strings", path))?;
    Ok(outputs)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacks {
    stacks: Vec<DescribedStack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedStack {
    #[serde(default)]
    outputs: Vec<DescribedOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedOutput {
    output_key: String,
    output_value: String,
}

/// Parse `describe-stacks` JSON into an outputs map
pub fn parse_describe_stacks(json: &str) -> Result<StackOutputs> {
    let described: DescribeStacks =
        serde_json::from_str(json).context("Unexpected describe-stacks response")?;
    let stack = described
        .stacks
        .into_iter()
        .next()
        .context("describe-stacks returned no stacks")?;
    Ok(stack
        .outputs
        .into_iter()
        .map(|o| (o.output_key, o.output_value))
        .collect())
}

/// Fetch the outputs of a deployed stack through the aws CLI
pub async fn describe_stack_outputs(aws_cli: &Path, stack_name: &str, region: &str) -> Result<StackOutputs> {
    let output = Command::new(aws_cli)
        .args([
            "cloudformation",
            "describe-stacks",
            "--stack-name",
            stack_name,
            "--region",
            region,
            "--output",
            "json",
        ])
        .output()
        .await
        .with_context(|| format!("Failed to run {:?}", aws_cli))?;

    if !output.status.success() {
        anyhow::bail!(
            "describe-stacks for {} failed: {}",
            stack_name,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_describe_stacks(&String::from_utf8_lossy(&output.stdout))
}
