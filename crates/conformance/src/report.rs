//! Per-scenario outcomes and the suite-level report.

use serde::Serialize;

use crate::error::{ConformanceError, FailureKind};
use crate::scenarios::ScenarioId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioGroup {
    Authorized,
    Unauthorized,
}

impl ScenarioGroup {
    /// `"widgets: authorized requests"`
    pub fn title(&self, endpoint: &str) -> String {
        match self {
            ScenarioGroup::Authorized => format!("{}: authorized requests", endpoint),
            ScenarioGroup::Unauthorized => format!("{}: unauthorized requests", endpoint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { kind: FailureKind, message: String },
    NotRun { reason: String },
}

impl Outcome {
    pub fn from_result(result: Result<(), ConformanceError>) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub id: ScenarioId,
    pub group: ScenarioGroup,
    pub title: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub id: Option<i64>,
    pub reason: String,
}

/// Result of the cleanup pass. Failures here never fail the suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Objects the final listing returned.
    pub listed: usize,
    pub deleted: Vec<i64>,
    pub failed: Vec<TeardownFailure>,
    /// Set when the final listing itself could not be read.
    pub list_error: Option<String>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.list_error.is_none()
    }
}

/// Everything one resource suite produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub endpoint: String,
    pub resource: String,
    pub setup_error: Option<String>,
    pub scenarios: Vec<ScenarioReport>,
    pub teardown: Option<TeardownReport>,
}

impl SuiteReport {
    pub fn new(endpoint: impl Into<String>, resource: impl Into<String>) -> Self {
        SuiteReport {
            endpoint: endpoint.into(),
            resource: resource.into(),
            setup_error: None,
            scenarios: Vec::new(),
            teardown: None,
        }
    }

    pub fn record(&mut self, id: ScenarioId, outcome: Outcome) {
        self.scenarios.push(ScenarioReport {
            id,
            group: id.group(),
            title: id.title(&self.endpoint, &self.resource),
            outcome,
        });
    }

    /// Scenarios that did not pass, including ones that never ran.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.outcome.is_passed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn passed_count(&self) -> usize {
        self.scenarios.len() - self.failure_count()
    }

    /// True when setup succeeded and every scenario passed. Teardown is not considered.
    pub fn passed(&self) -> bool {
        self.setup_error.is_none() && self.failure_count() == 0
    }

    /// Multi-line description of what went wrong, for panics and logs.
    pub fn failure_summary(&self) -> String {
        let mut lines = vec![format!(
            "{} ({}): {} of {} scenarios failed",
            self.endpoint,
            self.resource,
            self.failure_count(),
            self.scenarios.len()
        )];
        if let Some(ref error) = self.setup_error {
            lines.push(format!("  setup: {}", error));
        }
        for failure in self.failures() {
            let detail = match &failure.outcome {
                Outcome::Failed { kind, message } => format!("[{}] {}", kind, message),
                Outcome::NotRun { reason } => format!("[not run] {}", reason),
                Outcome::Passed => continue,
            };
            lines.push(format!("  {}: {}", failure.title, detail));
        }
        lines.join("\n")
    }
}
