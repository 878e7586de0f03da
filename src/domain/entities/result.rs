use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::status::CheckStatus;

/// Verdict on one subject (a mount point, a container, a pipeline step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub subject: String,
    pub status: CheckStatus,
    pub message: String,
}

impl Finding {
    #[must_use]
    pub fn new(subject: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            status,
            message: message.into(),
        }
    }
}

/// Remediation command issued (or planned, in dry-run) for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTaken {
    pub subject: String,
    pub command: String,
    pub executed: bool,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

/// Outcome of one check run. Ephemeral: reported, notified, discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: String,
    pub timestamp: DateTime<Utc>,
    /// Raw observed value(s), rendered for humans
    pub value: Option<String>,
    pub status: CheckStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionTaken>,
}

impl CheckResult {
    #[must_use]
    pub fn new(
        check: impl Into<String>,
        status: CheckStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            timestamp: Utc::now(),
            value: None,
            status,
            message: message.into(),
            findings: Vec::new(),
            skipped: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Result for a check that could not be evaluated at all.
    #[must_use]
    pub fn error(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check, CheckStatus::Error, message)
    }
}
