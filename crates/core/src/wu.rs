// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The work unit spec type, persisted as one human-editable YAML file per WU.

use crate::date::CivilDate;
use crate::id::WuId;
use crate::lane;
use crate::status::WuStatus;
use serde::{Deserialize, Serialize};

/// Kind of work a WU represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WuType {
    #[default]
    Feature,
    Bug,
    Refactor,
    Documentation,
    Chore,
    Spike,
}

/// Priority band, P0 (urgent) through P3 (whenever).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
}

/// Test expectations for a WU, grouped by harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestsSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unit: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub e2e: Vec<String>,
}

impl TestsSpec {
    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.unit.is_empty() && self.e2e.is_empty()
    }
}

/// A unit of assignable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub id: WuId,
    pub title: String,
    pub lane: String,
    #[serde(rename = "type", default)]
    pub wu_type: WuType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_status")]
    pub status: WuStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance: Vec<String>,
    #[serde(default, skip_serializing_if = "TestsSpec::is_empty")]
    pub tests: TestsSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<WuId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<WuId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    pub created: CivilDate,
}

fn default_status() -> WuStatus {
    WuStatus::Ready
}

impl WorkUnit {
    /// Minimal constructor for a freshly created WU.
    pub fn new(id: WuId, title: impl Into<String>, lane: impl Into<String>, created: CivilDate) -> Self {
        Self {
            id,
            title: title.into(),
            lane: lane.into(),
            wu_type: WuType::default(),
            priority: Priority::default(),
            status: WuStatus::Ready,
            initiative: None,
            phase: None,
            code_paths: Vec::new(),
            acceptance: Vec::new(),
            tests: TestsSpec::default(),
            blocked_by: Vec::new(),
            dependencies: Vec::new(),
            notes: None,
            exposure: None,
            plan: None,
            created,
        }
    }

    /// Schema-level validation. Returns human-readable problems, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.title.trim().is_empty() {
            problems.push("title must not be empty".to_string());
        }
        if !lane::is_well_formed(&self.lane) {
            problems.push(format!(
                "lane `{}` must look like `<Domain>: <Lane>`",
                self.lane
            ));
        }
        if self.blocked_by.contains(&self.id) {
            problems.push(format!("{} cannot be blocked by itself", self.id));
        }
        if self.dependencies.contains(&self.id) {
            problems.push(format!("{} cannot depend on itself", self.id));
        }
        problems
    }

    /// Problems that make the WU too incomplete to claim.
    pub fn claim_blockers(&self) -> Vec<String> {
        let mut problems = self.validate();
        if self.acceptance.is_empty() {
            problems.push("acceptance criteria are required before claiming".to_string());
        }
        problems
    }

    /// Problems that make the WU too incomplete to mark done.
    pub fn done_blockers(&self) -> Vec<String> {
        let mut problems = self.validate();
        if self.acceptance.is_empty() {
            problems.push("a done WU needs acceptance criteria".to_string());
        }
        if self.tests.is_empty() {
            problems.push("a done WU needs at least one test reference".to_string());
        }
        problems
    }
}

#[cfg(test)]
#[path = "wu_tests.rs"]
mod tests;
