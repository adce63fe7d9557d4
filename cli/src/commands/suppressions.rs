// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Suppression list commands
//!
//! Commands: validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use vigil_core::domain::deploy_config::DeployConfigManifest;
use vigil_core::domain::suppression::{ConstraintValidator, ValidationOutcome};

use super::CommandFailure;

#[derive(Subcommand)]
pub enum SuppressionsCommand {
    /// Check a suppression list against the configured limits
    Validate {
        /// JSON or YAML file: a list of patterns, or a map with a `suppressions` list
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print violations as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: SuppressionsCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        SuppressionsCommand::Validate { file, json } => validate(config_override, file, json).await,
    }
}

/// Read the patterns from a suppression list file
///
/// Unquoted scalars keep their written form, so an account ID such as
/// `123456789012` is read as a pattern rather than rejected as a number.
pub fn read_suppressions(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read suppressions from {:?}", path))?;
    let document: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse suppressions in {:?}", path))?;

    let items = match document {
        Value::Sequence(items) => items,
        Value::Mapping(mut document) => match document.remove("suppressions") {
            Some(Value::Sequence(items)) => items,
            _ => anyhow::bail!("{:?} must have a `suppressions` list", path),
        },
        _ => anyhow::bail!("{:?} must hold a list of patterns", path),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            scalar_pattern(item)
                .with_context(|| format!("suppressions.{} in {:?} must be a string pattern", index, path))
        })
        .collect()
}

fn scalar_pattern(item: Value) -> Option<String> {
    match item {
        Value::String(pattern) => Some(pattern),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

async fn validate(config_override: Option<PathBuf>, file: PathBuf, json: bool) -> Result<()> {
    let config = DeployConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let validator = ConstraintValidator::with_limits(config.spec.suppressions);
    let patterns = read_suppressions(&file)?;

    let outcome = validator.validate(&patterns);
    if json {
        println!("{}", serde_json::to_string_pretty(outcome.violations())?);
    }

    match outcome {
        ValidationOutcome::Valid => {
            if !json {
                println!(
                    "{}",
                    format!("✓ {} pattern(s) in {} are valid", patterns.len(), file.display()).green()
                );
            }
            Ok(())
        }
        ValidationOutcome::Invalid(violations) => {
            if !json {
                println!("{}", format!("✗ {} is invalid:", file.display()).red());
                for violation in &violations {
                    println!("  - {} {}", violation.kind.to_string().bold(), violation.message);
                }
            }
            Err(CommandFailure::InvalidSuppressions {
                violations: violations.len(),
            }
            .into())
        }
    }
}
