// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use vigil_core::domain::deploy_config::DeployConfigManifest;

const MINIMAL_CONFIG: &str = include_str!("../../templates/config-minimal.yaml");
const EXAMPLE_CONFIG: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Also require the settings a deployment needs
        #[arg(long)]
        deploy: bool,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./vigil-config.yaml)
        #[arg(short, long, default_value = "./vigil-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file, deploy } => validate(file.or(config_override), deploy).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

fn or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        value.to_string()
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = DeployConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. VIGIL_CONFIG_PATH: {}",
            std::env::var("VIGIL_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./vigil-config.yaml");
        println!("  4. ~/.vigil/config.yaml");
        println!("  5. /etc/vigil/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let aws = &config.spec.aws;
    println!("{}", "AWS:".bold());
    println!("  Region: {}", or_unset(&aws.region));
    println!("  Bucket: {}", or_unset(&aws.bucket));
    if let Some(cli) = &aws.cli_path {
        println!("  CLI: {}", cli.display());
    }
    println!();

    let monitoring = &config.spec.monitoring;
    println!("{}", "Monitoring:".bold());
    println!("  Stack: {}", monitoring.stack_name);
    println!("  Template: {}", monitoring.template.display());
    println!("  Artifacts: {}", monitoring.artifact_dir.display());
    println!("  Alarm topic: {}", or_unset(&monitoring.alarm_topic_arn));
    println!("  Functions: {}", monitoring.functions.len());
    for function in &monitoring.functions {
        println!("    - {} ({})", function.name, function.log_group());
    }
    if !monitoring.output_alarms.is_empty() {
        println!("  Output alarms: {}", monitoring.output_alarms.len());
        for alarm in &monitoring.output_alarms {
            println!("    - {} → {}/{}", alarm.output, alarm.namespace, alarm.metric_name);
        }
    }
    for (name, value) in &monitoring.parameters {
        println!("  Parameter {} = {}", name, value);
    }
    for (name, output) in &monitoring.parameter_outputs {
        println!("  Parameter {} ← output {}", name, output);
    }
    println!();

    println!("{}", "Suppressions:".bold());
    println!("  Max items: {}", config.spec.suppressions.max_items);
    println!("  Max pattern length: {}", config.spec.suppressions.max_pattern_length);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>, for_deployment: bool) -> Result<()> {
    println!("Validating configuration...");

    let config = DeployConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    let checked = if for_deployment {
        config.validate_for_deployment()
    } else {
        config.validate()
    };
    checked.context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples { EXAMPLE_CONFIG } else { MINIMAL_CONFIG };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_configs_parse_and_validate() {
        let minimal = DeployConfigManifest::from_yaml_str(MINIMAL_CONFIG).unwrap();
        minimal.validate().unwrap();

        let example = DeployConfigManifest::from_yaml_str(EXAMPLE_CONFIG).unwrap();
        example.validate_for_deployment().unwrap();
        assert_eq!(example.spec.monitoring.functions.len(), 2);
        assert_eq!(example.spec.monitoring.output_alarms[0].output, "GraphQLApiId");
        assert_eq!(
            example.spec.monitoring.parameter_spec().from_outputs.get("ApiId").map(String::as_str),
            Some("GraphQLApiId")
        );
    }

    #[tokio::test]
    async fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("vigil-config.yaml");

        generate(output.clone(), true).await.unwrap();
        validate(Some(output.clone()), false).await.unwrap();

        generate(output.clone(), false).await.unwrap();
        // The minimal sample leaves bucket and topic to the environment
        let config = DeployConfigManifest::from_yaml_file(&output).unwrap();
        assert!(config.validate_for_deployment().is_err());
    }
}
