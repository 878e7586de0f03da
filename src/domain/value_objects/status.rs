use serde::{Deserialize, Serialize};

/// Outcome of a single check run.
///
/// Variants are declared in escalation order: a probe that could not be
/// evaluated (`Error`) outranks a warning but not a confirmed critical.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    #[default]
    Ok,
    Warn,
    Error,
    Critical,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Ok(Self::Ok),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "critical" | "crit" => Ok(Self::Critical),
            other => Err(format!(
                "unknown status '{other}' (expected ok, warn, error, critical)"
            )),
        }
    }
}

impl CheckStatus {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    #[must_use]
    pub const fn emoji(&self) -> &str {
        match self {
            Self::Ok => "✅",
            Self::Warn => "⚠️",
            Self::Error => "❓",
            Self::Critical => "🔴",
        }
    }

    /// Worst status of a set; `Ok` when empty.
    pub fn worst<I: IntoIterator<Item = Self>>(statuses: I) -> Self {
        statuses.into_iter().max().unwrap_or_default()
    }
}
