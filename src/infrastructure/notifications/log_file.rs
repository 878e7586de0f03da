use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::entities::result::CheckResult;
use crate::domain::ports::notifier::{NotificationError, Notifier};
use crate::domain::value_objects::status::CheckStatus;

/// Appends each delivered result to a file as one JSON line.
pub struct LogFileNotifier {
    path: PathBuf,
    min_status: CheckStatus,
}

impl LogFileNotifier {
    #[must_use]
    pub fn new(path: &str, min_status: CheckStatus) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
            min_status,
        }
    }

    async fn append_json_line(&self, line: &str) -> Result<(), NotificationError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                NotificationError::SendFailed(format!("cannot create log directory: {e}"))
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                NotificationError::SendFailed(format!(
                    "cannot open {}: {e}",
                    self.path.display()
                ))
            })?;

        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| {
                NotificationError::SendFailed(format!(
                    "cannot write {}: {e}",
                    self.path.display()
                ))
            })
    }
}

#[async_trait]
impl Notifier for LogFileNotifier {
    fn channel(&self) -> &'static str {
        "log"
    }

    fn min_status(&self) -> CheckStatus {
        self.min_status
    }

    async fn notify(&self, result: &CheckResult) -> Result<(), NotificationError> {
        let line = serde_json::to_string(result)
            .map_err(|e| NotificationError::SendFailed(format!("JSON serialization: {e}")))?;
        self.append_json_line(&line).await
    }
}
