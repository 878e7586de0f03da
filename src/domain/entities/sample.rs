use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed observation extracted from tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// The field was expected but absent or unparseable
    Missing,
}

impl Value {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Parses a numeric field, mapping garbage to `Missing`.
    /// A trailing `%` is tolerated (`"85%"` → 85.0).
    #[must_use]
    pub fn parse_number(raw: &str) -> Self {
        raw.trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or(Self::Missing, Self::Number)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
            Self::Missing => write!(f, "<missing>"),
        }
    }
}

/// Renders whole numbers without decimals, others with one.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n:.1}")
    }
}

/// One `(metric, subject) → value` observation.
///
/// `metric` selects which threshold rules apply; `subject` names what was
/// measured (a mount point, a container, a domain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub metric: String,
    pub subject: String,
    pub value: Value,
    /// Suffix used when rendering numbers (`"%"`, `" days"`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

impl Sample {
    #[must_use]
    pub fn new(metric: impl Into<String>, subject: impl Into<String>, value: Value) -> Self {
        Self {
            metric: metric.into(),
            subject: subject.into(),
            value,
            unit: String::new(),
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Value rendered with its unit, e.g. `85%`.
    #[must_use]
    pub fn display_value(&self) -> String {
        match self.value {
            Value::Number(_) => format!("{}{}", self.value, self.unit),
            _ => self.value.to_string(),
        }
    }
}
