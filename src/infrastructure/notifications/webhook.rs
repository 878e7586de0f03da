use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::entities::result::CheckResult;
use crate::domain::ports::notifier::{NotificationError, Notifier};
use crate::domain::value_objects::status::CheckStatus;

/// Webhook notification format, auto-detected from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebhookFormat {
    Slack,
    Discord,
    Generic,
}

/// Posts check results to an HTTP webhook endpoint.
///
/// Supports Slack (colored attachments), Discord (embeds), and generic JSON
/// payloads. The format is auto-detected from the webhook host.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
    min_status: CheckStatus,
}

impl WebhookNotifier {
    /// Creates a new webhook notifier targeting the given URL.
    ///
    /// The HTTP client is configured with a 5-second timeout covering
    /// DNS resolution, connection, and response.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::ChannelUnavailable` if the HTTP client
    /// cannot be initialized (e.g. TLS backend failure).
    pub fn new(url: impl Into<String>, min_status: CheckStatus) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                NotificationError::ChannelUnavailable(format!("cannot build HTTP client: {e}"))
            })?;

        Ok(Self {
            url: url.into(),
            client,
            min_status,
        })
    }

    fn detect_format(&self) -> WebhookFormat {
        // Match on the host, not a substring of the whole URL
        let host = self
            .url
            .split("//")
            .nth(1)
            .and_then(|s| s.split('/').next())
            .and_then(|h| h.split(':').next())
            .unwrap_or("");

        if host == "hooks.slack.com" {
            WebhookFormat::Slack
        } else if host == "discord.com" || host == "discordapp.com" {
            WebhookFormat::Discord
        } else {
            WebhookFormat::Generic
        }
    }

    const fn status_color_hex(status: CheckStatus) -> &'static str {
        match status {
            CheckStatus::Ok => "#2ECC71",
            CheckStatus::Warn => "#E67E22",
            CheckStatus::Error => "#95A5A6",
            CheckStatus::Critical => "#FF0000",
        }
    }

    const fn status_color_decimal(status: CheckStatus) -> u32 {
        match status {
            CheckStatus::Ok => 0x00_2E_CC_71,
            CheckStatus::Warn => 0x00_E6_7E_22,
            CheckStatus::Error => 0x00_95_A5_A6,
            CheckStatus::Critical => 0x00_FF_00_00,
        }
    }

    fn format_result(&self, result: &CheckResult) -> Value {
        match self.detect_format() {
            WebhookFormat::Slack => Self::format_slack(result),
            WebhookFormat::Discord => Self::format_discord(result),
            WebhookFormat::Generic => Self::format_generic(result),
        }
    }

    fn format_slack(result: &CheckResult) -> Value {
        let mut text = result.message.clone();
        for finding in result.findings.iter().filter(|f| !f.status.is_ok()) {
            let _ = write!(
                text,
                "\n\u{2022} [{}] {}: {}",
                finding.status, finding.subject, finding.message
            );
        }
        if !result.skipped.is_empty() {
            let _ = write!(text, "\n*Skipped:* {}", result.skipped.join(", "));
        }

        json!({
            "attachments": [{
                "color": Self::status_color_hex(result.status),
                "blocks": [
                    {
                        "type": "header",
                        "text": {
                            "type": "plain_text",
                            "text": format!("{} opsguard: {}", result.status.emoji(), result.check)
                        }
                    },
                    {
                        "type": "section",
                        "fields": [
                            { "type": "mrkdwn", "text": format!("*Status:*\n{}", result.status) },
                            { "type": "mrkdwn", "text": format!("*Value:*\n{}", result.value.as_deref().unwrap_or("-")) }
                        ]
                    },
                    {
                        "type": "section",
                        "text": { "type": "mrkdwn", "text": text }
                    }
                ]
            }]
        })
    }

    fn format_discord(result: &CheckResult) -> Value {
        let mut fields = vec![json!({
            "name": "Status",
            "value": result.status.to_string(),
            "inline": true
        })];
        if let Some(value) = &result.value {
            fields.push(json!({ "name": "Value", "value": value, "inline": true }));
        }
        for action in &result.actions {
            fields.push(json!({
                "name": format!("Action on {}", action.subject),
                "value": format!("`{}`", action.command),
                "inline": false
            }));
        }

        json!({
            "username": "opsguard",
            "embeds": [{
                "title": format!("{} {}", result.status.emoji(), result.check),
                "description": &result.message,
                "color": Self::status_color_decimal(result.status),
                "fields": fields,
                "timestamp": result.timestamp.to_rfc3339()
            }]
        })
    }

    fn format_generic(result: &CheckResult) -> Value {
        json!({
            "source": "opsguard",
            "check": &result.check,
            "status": result.status.to_string(),
            "message": &result.message,
            "value": &result.value,
            "timestamp": result.timestamp.to_rfc3339(),
            "findings": &result.findings,
            "skipped": &result.skipped,
            "actions": &result.actions
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    fn min_status(&self) -> CheckStatus {
        self.min_status
    }

    async fn notify(&self, result: &CheckResult) -> Result<(), NotificationError> {
        let payload = self.format_result(result);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("webhook error: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotificationError::SendFailed(format!(
                "webhook HTTP {}",
                response.status()
            )))
        }
    }
}
