use std::time::Duration;

use crate::application::services::dispatcher::Dispatcher;
use crate::domain::value_objects::status::CheckStatus;

/// Runs the named checks every `interval_secs` until Ctrl-C.
///
/// Names are validated before the first cycle. Each cycle is logged; a
/// failing check never stops the loop. SIGTERM is not handled: under
/// systemd, stop the unit with `KillSignal=SIGINT`.
///
/// # Errors
///
/// Returns an error if a name is unknown.
pub async fn run_daemon(
    dispatcher: &Dispatcher<'_>,
    names: &[String],
    interval_secs: u64,
    parallel: bool,
) -> anyhow::Result<()> {
    for name in names {
        dispatcher.lookup(name)?;
    }

    let interval_secs = interval_secs.max(1);
    tracing::info!(
        checks = names.len(),
        "daemon started (interval: {interval_secs}s)"
    );
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match dispatcher.dispatch_all(names, parallel).await {
                    Ok(results) => {
                        let failing = results.iter().filter(|r| !r.status.is_ok()).count();
                        let worst = CheckStatus::worst(results.iter().map(|r| r.status));
                        tracing::info!(
                            checks = results.len(),
                            failing,
                            worst = %worst,
                            "cycle finished"
                        );
                    }
                    Err(e) => {
                        tracing::error!("cycle failed: {e}");
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::catalog::Catalog;
    use crate::application::services::alerter::Alerter;
    use crate::domain::entities::check::{CheckDefinition, CheckPlan, Step, Surface};
    use crate::domain::entities::command::{CommandSpec, ProbeOutput};
    use crate::domain::ports::collector::{Collector, CollectorError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCollector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Collector for CountingCollector {
        async fn run(&self, command: &CommandSpec) -> Result<ProbeOutput, CollectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CollectorError::Timeout {
                command: command.to_string(),
                after: Duration::from_secs(1),
            })
        }
    }

    fn catalog() -> Catalog {
        std::iter::once(CheckDefinition::new(
            "heartbeat",
            "test",
            Surface::Command,
            CheckPlan::Sequence(vec![Step::new(
                "ping",
                CommandSpec::new("true", Vec::<String>::new()),
            )]),
        ))
        .collect()
    }

    #[tokio::test]
    async fn daemon_keeps_running_after_failing_cycle() {
        let collector = CountingCollector {
            calls: AtomicUsize::new(0),
        };
        let catalog = catalog();
        let alerter = Alerter::default();
        let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

        let result = tokio::time::timeout(
            Duration::from_millis(200),
            run_daemon(&dispatcher, &["heartbeat".to_string()], 1, false),
        )
        .await;

        // Timeout expected: the daemon loops until ctrl_c
        assert!(result.is_err());
        assert_eq!(collector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_name_fails_before_first_cycle() {
        let collector = CountingCollector {
            calls: AtomicUsize::new(0),
        };
        let catalog = catalog();
        let alerter = Alerter::default();
        let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

        let result = tokio::time::timeout(
            Duration::from_millis(200),
            run_daemon(&dispatcher, &["nope".to_string()], 1, false),
        )
        .await
        .expect("returns immediately");
        assert!(result.is_err());
        assert_eq!(collector.calls.load(Ordering::SeqCst), 0);
    }
}
