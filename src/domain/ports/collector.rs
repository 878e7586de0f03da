use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::command::{CommandSpec, ProbeOutput};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("{command} exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("{command} timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },
}

#[async_trait]
pub trait Collector: Send + Sync {
    /// Run one external command and capture its output.
    ///
    /// Single attempt, no retries. Output is returned as-is; parsing
    /// belongs to the extractor.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError` if the process cannot be spawned, exits
    /// with a code the command does not accept, or exceeds its timeout.
    async fn run(&self, command: &CommandSpec) -> Result<ProbeOutput, CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_error_display() {
        let err = CollectorError::Spawn {
            program: "kubectl".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to start kubectl: No such file or directory"
        );

        let err = CollectorError::NonZeroExit {
            command: "npm run lint".to_string(),
            code: 2,
            stderr: "3 problems".to_string(),
        };
        assert_eq!(err.to_string(), "npm run lint exited with code 2: 3 problems");

        let err = CollectorError::Timeout {
            command: "docker ps".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "docker ps timed out after 30s");
    }
}
