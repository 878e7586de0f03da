use serde::{Deserialize, Serialize};

/// How a threshold rule compares an observed value with its limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Comparator {
    /// Numeric: alert when the value is above the limit
    Gt,
    /// Numeric: alert when the value is below the limit
    Lt,
    /// Textual: alert when the value contains the limit text
    Contains,
    /// Textual: alert when the value differs from the limit text
    NotEqual,
    /// Timestamp: alert when the value is older than the limit (in days)
    AgeExceeds,
}

impl Comparator {
    /// Symbol used when rendering a breached rule in a message.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Contains => "contains",
            Self::NotEqual => "!=",
            Self::AgeExceeds => "older than",
        }
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Gt | Self::Lt)
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gt => write!(f, "gt"),
            Self::Lt => write!(f, "lt"),
            Self::Contains => write!(f, "contains"),
            Self::NotEqual => write!(f, "not-equal"),
            Self::AgeExceeds => write!(f, "age-exceeds"),
        }
    }
}
