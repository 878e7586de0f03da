use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::result::CheckResult;
use crate::domain::value_objects::status::CheckStatus;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("notification channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sink key used by check definitions to select targets (`email`, `webhook`, `log`).
    fn channel(&self) -> &'static str;

    /// Lowest status this sink delivers.
    fn min_status(&self) -> CheckStatus {
        CheckStatus::Warn
    }

    /// Deliver one check result.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError` if the message cannot be built or the
    /// channel rejects it. Callers log and continue.
    async fn notify(&self, result: &CheckResult) -> Result<(), NotificationError>;
}
