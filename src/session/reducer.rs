//! Result reducer
//!
//! Folds the flat lifecycle stream into a suite tree. Open suites live on a
//! stack seeded with the unnamed root; a closed suite is handed to its
//! parent, so at the end the root owns the whole tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::jasmine::{FailureRecord, LifecycleEvent, SpecInfo, SpecStatus};

/// First failure of a spec, with every failure folded into `message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<FailureRecord> for SummarizedError {
    fn from(record: FailureRecord) -> Self {
        Self {
            message: record.message,
            stack: record.stack,
            extra: record.extra,
        }
    }
}

/// Outcome of one spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SummarizedError>,
}

impl TestResult {
    fn from_spec(spec: &SpecInfo) -> Self {
        let status = spec.status.unwrap_or(SpecStatus::Unknown);
        Self {
            name: spec.description.clone(),
            passed: status == SpecStatus::Passed,
            skipped: status == SpecStatus::Excluded,
            error: summarize_failures(&spec.failed_expectations),
        }
    }

    /// Counts as passing for aggregation
    pub fn ok(&self) -> bool {
        self.passed || self.skipped
    }
}

/// A suite and everything declared inside it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// `None` only for the implicit root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub suites: Vec<SuiteResult>,
    pub tests: Vec<TestResult>,
}

impl SuiteResult {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Every direct test passed or was skipped, and every child suite passed
    pub fn passed(&self) -> bool {
        self.tests.iter().all(TestResult::ok) && self.suites.iter().all(SuiteResult::passed)
    }

    /// Recursive test counts
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for test in &self.tests {
            if test.passed {
                tally.passed += 1;
            } else if test.skipped {
                tally.skipped += 1;
            } else {
                tally.failed += 1;
            }
        }
        for suite in &self.suites {
            tally += suite.tally();
        }
        tally
    }
}

/// Test counts across a suite tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// What the host receives for a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub passed: bool,
    pub test_results: SuiteResult,
}

/// Collapse a spec's failures into one error
///
/// A single failure is kept verbatim. Several failures are numbered
/// `(i/n)` and joined by newlines; the other fields come from the first.
pub fn summarize_failures(failures: &[FailureRecord]) -> Option<SummarizedError> {
    let first = failures.first()?;
    let mut summary = SummarizedError::from(first.clone());

    if failures.len() > 1 {
        let total = failures.len();
        summary.message = failures
            .iter()
            .enumerate()
            .map(|(i, f)| format!("({}/{}) {}", i + 1, total, f.message))
            .collect::<Vec<_>>()
            .join("\n");
    }
    Some(summary)
}

/// Build the result tree from a complete event sequence
pub fn reduce(events: &[LifecycleEvent]) -> Result<RunResult> {
    let mut stack = vec![SuiteResult::default()];

    for event in events {
        match event {
            LifecycleEvent::SuiteStarted(info) => {
                stack.push(SuiteResult::named(info.description.clone()));
            }
            LifecycleEvent::SuiteDone(info) => {
                if stack.len() == 1 {
                    return Err(Error::protocol_violation(format!(
                        "suiteDone for '{}' without an open suite",
                        info.description
                    )));
                }
                if let Some(done) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.suites.push(done);
                    }
                }
            }
            LifecycleEvent::SpecDone(spec) => {
                if let Some(top) = stack.last_mut() {
                    top.tests.push(TestResult::from_spec(spec));
                }
            }
            LifecycleEvent::JasmineStarted(_)
            | LifecycleEvent::SpecStarted(_)
            | LifecycleEvent::JasmineDone(_) => {}
        }
    }

    if stack.len() > 1 {
        let open: Vec<_> = stack[1..]
            .iter()
            .filter_map(|s| s.name.as_deref())
            .collect();
        return Err(Error::protocol_violation(format!(
            "run ended with open suites: {}",
            open.join(" > ")
        )));
    }

    let root = stack.pop().unwrap_or_default();
    Ok(RunResult {
        passed: root.passed(),
        test_results: root,
    })
}
