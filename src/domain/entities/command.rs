use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::command_class::CommandClass;

/// Placeholder replaced by the candidate subject in remediation commands.
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";
/// Placeholder replaced by the run timestamp (`%Y%m%d_%H%M%S`).
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// One external command, described as argv rather than a shell string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub class: CommandClass,
    /// Explicit timeout; falls back to the class default when `None`
    pub timeout: Option<Duration>,
    /// Exit codes that count as a successful probe
    pub accepted_exit_codes: Vec<i32>,
}

impl CommandSpec {
    #[must_use]
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
            class: CommandClass::default(),
            timeout: None,
            accepted_exit_codes: vec![0],
        }
    }

    /// Builds a command from a full argv (`["npm", "run", "lint"]`).
    /// Returns `None` for an empty argv.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    #[must_use]
    pub fn class(mut self, class: CommandClass) -> Self {
        self.class = class;
        self
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn accept_exit_codes(mut self, codes: &[i32]) -> Self {
        self.accepted_exit_codes = codes.to_vec();
        self
    }

    #[must_use]
    pub fn accepts(&self, code: i32) -> bool {
        self.accepted_exit_codes.contains(&code)
    }

    /// Substitutes `{subject}` and `{timestamp}` in every argument.
    #[must_use]
    pub fn render(&self, subject: Option<&str>, now: DateTime<Utc>) -> Self {
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let mut rendered = self.clone();
        rendered.args = self
            .args
            .iter()
            .map(|arg| {
                let arg = arg.replace(TIMESTAMP_PLACEHOLDER, &stamp);
                match subject {
                    Some(s) => arg.replace(SUBJECT_PLACEHOLDER, s),
                    None => arg,
                }
            })
            .collect();
        rendered
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Raw output captured from one external command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub elapsed: Duration,
}

impl ProbeOutput {
    /// Convenience constructor for a successful run with the given stdout.
    #[must_use]
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }
}
