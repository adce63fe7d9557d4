// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::suppression::SuppressionList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyId(pub String);

impl PolicyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One immutable version of a policy's suppressions.
///
/// Edits never change a stored version; they produce the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub version: u32,
    pub suppressions: SuppressionList,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn first(id: PolicyId, suppressions: SuppressionList, updated_by: Option<String>) -> Self {
        Self {
            id,
            version: 1,
            suppressions,
            updated_by,
            updated_at: Utc::now(),
        }
    }

    /// The version that supersedes this one
    pub fn supersede(&self, suppressions: SuppressionList, updated_by: Option<String>) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version + 1,
            suppressions,
            updated_by,
            updated_at: Utc::now(),
        }
    }
}

/// Incoming policy update carrying a user-supplied suppression list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyUpdateRequest {
    pub suppressions: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}
