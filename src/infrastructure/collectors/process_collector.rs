use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;

use crate::domain::entities::command::{CommandSpec, ProbeOutput};
use crate::domain::ports::collector::{Collector, CollectorError};
use crate::domain::value_objects::command_class::TimeoutPolicy;

const MAX_STDERR_BYTES: usize = 2048;

/// Runs probes as child processes with `tokio::process`.
///
/// The child is killed when its timeout fires (`kill_on_drop`). Stdin is
/// closed so tools that wait for input fail fast instead of hanging.
pub struct ProcessCollector {
    timeouts: TimeoutPolicy,
}

impl ProcessCollector {
    #[must_use]
    pub const fn new(timeouts: TimeoutPolicy) -> Self {
        Self { timeouts }
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new(TimeoutPolicy::default())
    }
}

#[async_trait]
impl Collector for ProcessCollector {
    async fn run(&self, command: &CommandSpec) -> Result<ProbeOutput, CollectorError> {
        let limit = command
            .timeout
            .unwrap_or_else(|| self.timeouts.for_class(command.class));

        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        let started = Instant::now();
        let output = tokio::time::timeout(limit, process.output())
            .await
            .map_err(|_| CollectorError::Timeout {
                command: command.to_string(),
                after: limit,
            })?
            .map_err(|e| CollectorError::Spawn {
                program: command.program.clone(),
                reason: e.to_string(),
            })?;
        let elapsed = started.elapsed();

        // Killed by a signal: no exit code
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::debug!(
            command = %command,
            code,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "probe finished"
        );

        if !command.accepts(code) {
            return Err(CollectorError::NonZeroExit {
                command: command.to_string(),
                code,
                stderr: truncate(stderr.trim(), MAX_STDERR_BYTES),
            });
        }

        Ok(ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
            exit_code: code,
            elapsed,
        })
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
