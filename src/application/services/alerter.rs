use crate::domain::entities::result::CheckResult;
use crate::domain::ports::notifier::Notifier;

/// Delivery outcome of one result across the selected sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    /// Sinks not targeted or whose minimum status was not reached
    pub skipped: usize,
}

/// Routes check results to the configured notifier sinks.
///
/// Every selected sink is called even when an earlier one fails. Failures
/// are logged and counted, never returned: alerting must not abort a run.
pub struct Alerter {
    sinks: Vec<Box<dyn Notifier>>,
}

impl Alerter {
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    /// Channel names of the configured sinks, in registration order.
    #[must_use]
    pub fn channels(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.channel()).collect()
    }

    /// Delivers `result` to every sink in `targets` (all sinks when empty).
    /// OK results are never delivered.
    pub async fn notify(&self, result: &CheckResult, targets: &[String]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if result.status.is_ok() {
            report.skipped = self.sinks.len();
            return report;
        }

        for sink in &self.sinks {
            let targeted = targets.is_empty() || targets.iter().any(|t| t == sink.channel());
            if !targeted || result.status < sink.min_status() {
                report.skipped += 1;
                continue;
            }
            match sink.notify(result).await {
                Ok(()) => {
                    tracing::debug!(
                        channel = sink.channel(),
                        check = %result.check,
                        "alert delivered"
                    );
                    report.delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        channel = sink.channel(),
                        check = %result.check,
                        "Notification failed: {e}"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl Default for Alerter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
