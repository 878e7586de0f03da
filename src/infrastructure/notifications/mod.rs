pub mod email;
pub mod log_file;
pub mod webhook;

use crate::application::config::NotificationConfig;
use crate::domain::ports::notifier::{NotificationError, Notifier};

use self::email::EmailNotifier;
use self::log_file::LogFileNotifier;
use self::webhook::WebhookNotifier;

/// Builds one sink per configured channel, in `log`, `webhook`, `email` order.
/// No sink is configured by default.
///
/// # Errors
///
/// Returns `NotificationError` if a configured sink cannot be initialized
/// (unparseable address, unset password variable, HTTP client failure).
pub fn create_notifiers(
    config: &NotificationConfig,
) -> Result<Vec<Box<dyn Notifier>>, NotificationError> {
    let mut sinks: Vec<Box<dyn Notifier>> = Vec::new();
    if let Some(path) = &config.log_file {
        sinks.push(Box::new(LogFileNotifier::new(path, config.min_status)));
    }
    if let Some(url) = &config.webhook_url {
        sinks.push(Box::new(WebhookNotifier::new(url.clone(), config.min_status)?));
    }
    if let Some(email) = &config.email {
        sinks.push(Box::new(EmailNotifier::new(email, config.min_status)?));
    }
    Ok(sinks)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::status::CheckStatus;

    #[test]
    fn nothing_configured_means_no_sinks() {
        let sinks = create_notifiers(&NotificationConfig::default()).expect("defaults");
        assert!(sinks.is_empty());
    }

    #[test]
    fn sinks_follow_configuration() {
        let config = NotificationConfig {
            min_status: CheckStatus::Critical,
            log_file: Some("/tmp/opsguard-alerts.log".to_string()),
            webhook_url: Some("https://hooks.slack.com/services/T/B/x".to_string()),
            ..NotificationConfig::default()
        };
        let sinks = create_notifiers(&config).expect("valid config");
        let channels: Vec<&str> = sinks.iter().map(|s| s.channel()).collect();
        assert_eq!(channels, vec!["log", "webhook"]);
        assert!(sinks.iter().all(|s| s.min_status() == CheckStatus::Critical));
    }
}
