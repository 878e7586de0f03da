use serde::{Deserialize, Serialize};

use crate::domain::entities::sample::format_number;
use crate::domain::value_objects::comparator::Comparator;

/// Limit a rule compares against: a number (percent, count, days) or a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Limit {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<f64> for Limit {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for Limit {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Limit {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A threshold applied to every sample whose metric matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: String,
    pub comparator: Comparator,
    /// Crossing this limit yields WARN
    pub warn: Limit,
    /// Crossing this limit yields CRITICAL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<Limit>,
    /// When set, a probe producing no sample for this metric is an ERROR
    #[serde(default)]
    pub require_samples: bool,
}

impl ThresholdRule {
    #[must_use]
    pub fn new(metric: impl Into<String>, comparator: Comparator, warn: impl Into<Limit>) -> Self {
        Self {
            metric: metric.into(),
            comparator,
            warn: warn.into(),
            critical: None,
            require_samples: false,
        }
    }

    #[must_use]
    pub fn gt(metric: impl Into<String>, warn: impl Into<Limit>) -> Self {
        Self::new(metric, Comparator::Gt, warn)
    }

    #[must_use]
    pub fn lt(metric: impl Into<String>, warn: impl Into<Limit>) -> Self {
        Self::new(metric, Comparator::Lt, warn)
    }

    #[must_use]
    pub fn critical_at(mut self, limit: impl Into<Limit>) -> Self {
        self.critical = Some(limit.into());
        self
    }

    /// Same limit for WARN and CRITICAL: any breach is critical.
    #[must_use]
    pub fn always_critical(mut self) -> Self {
        self.critical = Some(self.warn.clone());
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.require_samples = true;
        self
    }
}
