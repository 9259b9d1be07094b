//! Results of a check run, as sent to collectors and kept in the status file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a passing test, modelled on HTTP.
pub const STATUS_PASS: u16 = 200;

/// Status of a failing test.
pub const STATUS_FAIL: u16 = 500;

/// Outcome of one sub-test of a check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestResult {
    /// Name of the configured test
    #[serde(default)]
    pub name: String,

    /// 200 when the test passed, 500 otherwise
    pub status: u16,

    /// Human-facing problem text, only set on failure
    #[serde(default)]
    pub problem: String,

    /// Human-facing suggestion, only set on failure
    #[serde(default)]
    pub suggestion: String,

    /// When the test was evaluated
    pub time: DateTime<Utc>,

    /// Diagnostic message
    #[serde(default)]
    pub error: String,
}

impl TestResult {
    pub fn pass() -> Self {
        Self::with_status(STATUS_PASS)
    }

    pub fn fail(error: impl Into<String>) -> Self {
        let mut result = Self::with_status(STATUS_FAIL);
        result.error = error.into();
        result
    }

    fn with_status(status: u16) -> Self {
        Self {
            name: String::new(),
            status,
            problem: String::new(),
            suggestion: String::new(),
            time: Utc::now(),
            error: String::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == STATUS_PASS
    }
}

/// Outcome of one full check run, as persisted and sent to remotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckResult {
    /// Host that ran the check
    pub from: String,

    /// Host the check observed
    pub host: String,

    pub product: String,

    pub group: String,

    pub date: DateTime<Utc>,

    /// Run-level failure, e.g. the probe could not be set up
    #[serde(default)]
    pub error: String,

    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.error.is_empty() && self.results.iter().all(TestResult::passed)
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }
}
