// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Suppression List Validation
//!
//! A suppression list is the set of resource-identifier patterns exempted from
//! a policy's alerting. Policies still evaluate suppressed resources, but
//! failures on them neither alert nor remediate.
//!
//! ## Constraints
//!
//! | Kind | Rule |
//! |------|------|
//! | `TooManyItems` | at most `max_items` patterns (default 500) |
//! | `DuplicateItem` | patterns are pairwise distinct |
//! | `ItemTooLong` | each pattern at most `max_pattern_length` characters (default 1000) |
//!
//! Every rule runs on every list; the outcome carries all violations found so
//! a client can fix the whole list in one round trip.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Maximum number of patterns in one suppression list
pub const MAX_SUPPRESSIONS: usize = 500;

/// Maximum length of a single pattern, in characters
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// Ordered list of resource-identifier patterns attached to a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuppressionList(Vec<String>);

impl SuppressionList {
    pub fn new(patterns: Vec<String>) -> Self {
        Self(patterns)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for SuppressionList {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl FromIterator<String> for SuppressionList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Limits applied by the [`ConstraintValidator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionLimits {
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_max_pattern_length")]
    pub max_pattern_length: usize,
}

fn default_max_items() -> usize {
    MAX_SUPPRESSIONS
}

fn default_max_pattern_length() -> usize {
    MAX_PATTERN_LENGTH
}

impl Default for SuppressionLimits {
    fn default() -> Self {
        Self {
            max_items: MAX_SUPPRESSIONS,
            max_pattern_length: MAX_PATTERN_LENGTH,
        }
    }
}

/// Machine-readable violation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TooManyItems,
    DuplicateItem,
    ItemTooLong,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TooManyItems => "too_many_items",
            ViolationKind::DuplicateItem => "duplicate_item",
            ViolationKind::ItemTooLong => "item_too_long",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,

    /// Index of the offending pattern, when the violation is about one item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// The offending pattern, for duplicates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(violations) => violations,
        }
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations().iter().any(|v| v.kind == kind)
    }

    /// Convert into a `Result`, for callers that reject on any violation
    pub fn into_result(self) -> Result<(), SuppressionError> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(violations) => Err(SuppressionError::Rejected(violations)),
        }
    }
}

#[derive(Debug, Error)]
pub enum SuppressionError {
    #[error("suppression list rejected with {} violation(s)", .0.len())]
    Rejected(Vec<Violation>),
}

type Rule = fn(&[String], &SuppressionLimits) -> Vec<Violation>;

/// Rules run in this order; new constraints are added here only.
const RULES: &[(ViolationKind, Rule)] = &[
    (ViolationKind::TooManyItems, check_max_items),
    (ViolationKind::DuplicateItem, check_unique_items),
    (ViolationKind::ItemTooLong, check_pattern_length),
];

fn check_max_items(items: &[String], limits: &SuppressionLimits) -> Vec<Violation> {
    if items.len() <= limits.max_items {
        return Vec::new();
    }
    vec![Violation {
        kind: ViolationKind::TooManyItems,
        index: None,
        value: None,
        message: format!(
            "suppressions should have at most {} items, got {}",
            limits.max_items,
            items.len()
        ),
    }]
}

fn check_unique_items(items: &[String], _limits: &SuppressionLimits) -> Vec<Violation> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    let mut reported: HashSet<&str> = HashSet::new();
    let mut violations = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match seen.get(item.as_str()) {
            Some(first) => {
                if reported.insert(item.as_str()) {
                    violations.push(Violation {
                        kind: ViolationKind::DuplicateItem,
                        index: Some(index),
                        value: Some(item.clone()),
                        message: format!(
                            "suppressions.{} duplicates suppressions.{} ({:?})",
                            index, first, item
                        ),
                    });
                }
            }
            None => {
                seen.insert(item.as_str(), index);
            }
        }
    }

    violations
}

fn check_pattern_length(items: &[String], limits: &SuppressionLimits) -> Vec<Violation> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let length = item.chars().count();
            (length > limits.max_pattern_length).then(|| Violation {
                kind: ViolationKind::ItemTooLong,
                index: Some(index),
                value: None,
                message: format!(
                    "suppressions.{} should be at most {} chars long, got {}",
                    index, limits.max_pattern_length, length
                ),
            })
        })
        .collect()
}

/// Pure constraint checker for suppression lists
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    limits: SuppressionLimits,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SuppressionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SuppressionLimits {
        &self.limits
    }

    /// Run every rule against `items` and collect all violations.
    pub fn validate(&self, items: &[String]) -> ValidationOutcome {
        let violations: Vec<Violation> = RULES
            .iter()
            .flat_map(|(_, rule)| rule(items, &self.limits))
            .collect();

        if violations.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(violations)
        }
    }

    pub fn validate_list(&self, list: &SuppressionList) -> ValidationOutcome {
        self.validate(list.as_slice())
    }

    /// Kinds this validator checks, in evaluation order
    pub fn rule_kinds(&self) -> impl Iterator<Item = ViolationKind> {
        RULES.iter().map(|(kind, _)| *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("arn:aws:s3:::bucket-{}", i)).collect()
    }

    // ── Valid lists ───────────────────────────────────────────────────────────

    #[test]
    fn test_empty_list_is_valid() {
        let outcome = ConstraintValidator::new().validate(&[]);
        assert!(outcome.is_valid());
        assert!(outcome.violations().is_empty());
    }

    #[test]
    fn test_list_at_item_limit_is_valid() {
        let outcome = ConstraintValidator::new().validate(&patterns(MAX_SUPPRESSIONS));
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn test_pattern_at_length_limit_is_valid() {
        let items = vec!["a".repeat(MAX_PATTERN_LENGTH)];
        assert!(ConstraintValidator::new().validate(&items).is_valid());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 1000 two-byte characters is 2000 bytes but within the limit
        let items = vec!["é".repeat(MAX_PATTERN_LENGTH)];
        assert!(ConstraintValidator::new().validate(&items).is_valid());
    }

    // ── Violations ────────────────────────────────────────────────────────────

    #[test]
    fn test_too_many_items() {
        let outcome = ConstraintValidator::new().validate(&patterns(MAX_SUPPRESSIONS + 1));
        assert_eq!(outcome.violations().len(), 1);
        let violation = &outcome.violations()[0];
        assert_eq!(violation.kind, ViolationKind::TooManyItems);
        assert_eq!(violation.index, None);
        assert!(violation.message.contains("501"));
    }

    #[test]
    fn test_duplicate_identifies_value_and_index() {
        let items = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let outcome = ConstraintValidator::new().validate(&items);
        assert_eq!(outcome.violations().len(), 1);
        let violation = &outcome.violations()[0];
        assert_eq!(violation.kind, ViolationKind::DuplicateItem);
        assert_eq!(violation.index, Some(2));
        assert_eq!(violation.value.as_deref(), Some("a"));
    }

    #[test]
    fn test_duplicate_reported_once_per_value() {
        let items: Vec<String> = ["x", "x", "x", "y", "y"].iter().map(|s| s.to_string()).collect();
        let outcome = ConstraintValidator::new().validate(&items);
        let values: Vec<_> = outcome
            .violations()
            .iter()
            .map(|v| v.value.clone().unwrap())
            .collect();
        assert_eq!(values, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_duplicates_are_exact_match() {
        let items = vec!["Bucket".to_string(), "bucket".to_string(), "bucket ".to_string()];
        assert!(ConstraintValidator::new().validate(&items).is_valid());
    }

    #[test]
    fn test_item_too_long_reports_index() {
        let items = vec!["ok".to_string(), "a".repeat(MAX_PATTERN_LENGTH + 1)];
        let outcome = ConstraintValidator::new().validate(&items);
        assert_eq!(outcome.violations().len(), 1);
        assert_eq!(outcome.violations()[0].kind, ViolationKind::ItemTooLong);
        assert_eq!(outcome.violations()[0].index, Some(1));
    }

    #[test]
    fn test_all_violations_collected_in_rule_order() {
        let mut items = patterns(MAX_SUPPRESSIONS);
        items.push(items[0].clone());
        items.push("z".repeat(MAX_PATTERN_LENGTH + 1));

        let outcome = ConstraintValidator::new().validate(&items);
        let kinds: Vec<_> = outcome.violations().iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::TooManyItems,
                ViolationKind::DuplicateItem,
                ViolationKind::ItemTooLong,
            ]
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let items = vec!["a".to_string(), "a".to_string(), "b".repeat(1001)];
        let validator = ConstraintValidator::new();
        assert_eq!(validator.validate(&items), validator.validate(&items));
    }

    // ── Limits ────────────────────────────────────────────────────────────────

    #[test]
    fn test_custom_limits() {
        let validator = ConstraintValidator::with_limits(SuppressionLimits {
            max_items: 2,
            max_pattern_length: 3,
        });
        let items = vec!["abc".to_string(), "abcd".to_string(), "x".to_string()];
        let outcome = validator.validate(&items);
        assert!(outcome.has(ViolationKind::TooManyItems));
        assert!(outcome.has(ViolationKind::ItemTooLong));
        assert!(!outcome.has(ViolationKind::DuplicateItem));
    }

    #[test]
    fn test_rule_kinds_order() {
        let kinds: Vec<_> = ConstraintValidator::new().rule_kinds().collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::TooManyItems,
                ViolationKind::DuplicateItem,
                ViolationKind::ItemTooLong,
            ]
        );
    }

    #[test]
    fn test_into_result_carries_violations() {
        let items = vec!["a".to_string(), "a".to_string()];
        let err = ConstraintValidator::new().validate(&items).into_result().unwrap_err();
        match &err {
            SuppressionError::Rejected(violations) => assert_eq!(violations.len(), 1),
        }
        assert!(err.to_string().contains("1 violation"));
    }

    #[test]
    fn test_suppression_list_serializes_as_array() {
        let list = SuppressionList::new(vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
        let parsed: SuppressionList = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, list);
    }

    #[test]
    fn test_violation_kind_serialization() {
        let json = serde_json::to_string(&ViolationKind::ItemTooLong).unwrap();
        assert_eq!(json, "\"item_too_long\"");
    }
}
