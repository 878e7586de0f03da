use std::fmt::Write;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::application::config::EmailConfig;
use crate::domain::entities::result::CheckResult;
use crate::domain::ports::notifier::{NotificationError, Notifier};
use crate::domain::value_objects::status::CheckStatus;

/// Sends plain-text alert mails through an SMTP relay (STARTTLS).
///
/// Addresses are parsed up front so a bad configuration fails at startup,
/// not on the first alert.
pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    min_status: CheckStatus,
}

impl EmailNotifier {
    /// # Errors
    ///
    /// Returns `NotificationError::InvalidAddress` if `from` or `to` does not
    /// parse, and `NotificationError::ChannelUnavailable` if the relay host is
    /// unusable or `password_env` names an unset variable.
    pub fn new(config: &EmailConfig, min_status: CheckStatus) -> Result<Self, NotificationError> {
        let from = parse_mailbox(&config.from)?;
        let to = parse_mailbox(&config.to)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| {
                NotificationError::ChannelUnavailable(format!("SMTP relay {}: {e}", config.smtp_host))
            })?
            .port(config.smtp_port);

        if let Some(user) = &config.username {
            let password = match &config.password_env {
                Some(var) => std::env::var(var).map_err(|_| {
                    NotificationError::ChannelUnavailable(format!(
                        "SMTP password variable {var} is not set"
                    ))
                })?,
                None => String::new(),
            };
            builder = builder.credentials(Credentials::new(user.clone(), password));
        }

        Ok(Self {
            from,
            to,
            mailer: builder.build(),
            min_status,
        })
    }

    fn build_message(&self, result: &CheckResult) -> Result<Message, NotificationError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject(result))
            .header(ContentType::TEXT_PLAIN)
            .body(body(result))
            .map_err(|e| NotificationError::SendFailed(format!("cannot build message: {e}")))
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox, NotificationError> {
    raw.parse()
        .map_err(|e| NotificationError::InvalidAddress(format!("{raw}: {e}")))
}

fn subject(result: &CheckResult) -> String {
    format!("[opsguard] {} {}", result.status, result.check)
}

fn body(result: &CheckResult) -> String {
    let mut text = format!(
        "Check: {}\nStatus: {}\nTime: {}\n\n{}\n",
        result.check,
        result.status,
        result.timestamp.to_rfc3339(),
        result.message
    );
    if let Some(value) = &result.value {
        let _ = writeln!(text, "Value: {value}");
    }
    if !result.findings.is_empty() {
        text.push_str("\nFindings:\n");
        for finding in &result.findings {
            let _ = writeln!(
                text,
                "  [{}] {}: {}",
                finding.status, finding.subject, finding.message
            );
        }
    }
    if !result.skipped.is_empty() {
        let _ = writeln!(text, "\nSkipped: {}", result.skipped.join(", "));
    }
    for action in &result.actions {
        let state = if !action.executed {
            "planned"
        } else if action.success {
            "done"
        } else {
            "failed"
        };
        let _ = writeln!(text, "Action ({state}): {}", action.command);
    }
    text
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    fn min_status(&self) -> CheckStatus {
        self.min_status
    }

    async fn notify(&self, result: &CheckResult) -> Result<(), NotificationError> {
        let message = self.build_message(result)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP: {e}")))?;
        tracing::debug!(to = %self.to, check = %result.check, "alert mail sent");
        Ok(())
    }
}
