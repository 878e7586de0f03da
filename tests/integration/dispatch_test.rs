#![allow(clippy::expect_used)]

use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use opsguard::application::catalog::{build_catalog, Catalog};
use opsguard::application::config::AppConfig;
use opsguard::application::services::alerter::Alerter;
use opsguard::application::services::dispatcher::{
    exit_code, DispatchError, DispatchState, Dispatcher,
};
use opsguard::domain::entities::check::{CheckDefinition, CheckPlan, Probe, Surface};
use opsguard::domain::entities::command::{CommandSpec, ProbeOutput};
use opsguard::domain::entities::result::CheckResult;
use opsguard::domain::entities::rule::ThresholdRule;
use opsguard::domain::extractors::Extractor;
use opsguard::domain::ports::collector::{Collector, CollectorError};
use opsguard::domain::ports::notifier::{NotificationError, Notifier};
use opsguard::domain::value_objects::CheckStatus;

// ---------------------------------------------------------------------------
// RecordingCollector
// ---------------------------------------------------------------------------

/// Answers `echo`-style probes: stdout is the first argument, after an
/// optional delay in milliseconds given by the second.
struct RecordingCollector {
    calls: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
}

impl RecordingCollector {
    const fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }
}

#[async_trait]
impl Collector for RecordingCollector {
    async fn run(&self, command: &CommandSpec) -> Result<ProbeOutput, CollectorError> {
        self.calls.lock().expect("lock").push(command.to_string());
        let delay = command
            .args
            .get(1)
            .and_then(|d| d.parse::<u64>().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.finished
            .lock()
            .expect("lock")
            .push(command.args[0].clone());
        Ok(ProbeOutput::stdout(command.args[0].clone()))
    }
}

/// Probe check reading a number from `echo VALUE DELAY_MS`; WARN above 50.
fn number_check(name: &str, value: u32, delay_ms: u64) -> CheckDefinition {
    CheckDefinition::new(
        name,
        "number",
        Surface::Diagnostic,
        CheckPlan::Probe(Probe {
            label: name.to_string(),
            command: CommandSpec::new("echo", [value.to_string(), delay_ms.to_string()]),
            extractor: Extractor::Trimmed {
                metric: "value".into(),
                subject: name.to_string(),
            },
            rules: vec![ThresholdRule::gt("value", 50.0)],
        }),
    )
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, _result: &CheckResult) -> Result<(), NotificationError> {
        Err(NotificationError::ChannelUnavailable(
            "SMTP unreachable".into(),
        ))
    }
}

struct CountingNotifier {
    delivered: Arc<AtomicUsize>,
}

#[async_trait]
impl Notifier for CountingNotifier {
    fn channel(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, _result: &CheckResult) -> Result<(), NotificationError> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_check_makes_zero_external_calls() {
    let catalog = build_catalog(&AppConfig::default()).expect("default catalog");
    let collector = RecordingCollector::new();
    let alerter = Alerter::default();
    let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

    let err = dispatcher
        .dispatch_all(&["monitor".to_string(), "no-such-check".to_string()], false)
        .await
        .expect_err("unknown name");
    assert_eq!(err, DispatchError::UnknownCheck("no-such-check".into()));
    assert_eq!(collector.call_count(), 0);
    assert_eq!(dispatcher.state(), DispatchState::Idle);
}

#[tokio::test]
async fn exit_code_is_zero_only_when_every_check_is_ok() {
    let catalog: Catalog = [number_check("calm", 10, 0), number_check("hot", 90, 0)]
        .into_iter()
        .collect();
    let collector = RecordingCollector::new();
    let alerter = Alerter::default();
    let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

    let calm = dispatcher
        .dispatch_all(&["calm".to_string()], false)
        .await
        .expect("known");
    assert_eq!(exit_code(&calm), 0);

    let both = dispatcher
        .dispatch_all(&["calm".to_string(), "hot".to_string()], false)
        .await
        .expect("known");
    assert_eq!(both[1].status, CheckStatus::Warn);
    assert_eq!(exit_code(&both), 1);
}

#[tokio::test]
async fn notification_failure_does_not_stop_later_checks() {
    let catalog: Catalog = [number_check("first", 70, 0), number_check("second", 80, 0)]
        .into_iter()
        .collect();
    let collector = RecordingCollector::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let alerter = Alerter::new(vec![
        Box::new(FailingNotifier),
        Box::new(CountingNotifier {
            delivered: Arc::clone(&delivered),
        }),
    ]);
    let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

    let results = dispatcher
        .dispatch_all(&["first".to_string(), "second".to_string()], false)
        .await
        .expect("known");
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.status == CheckStatus::Warn));
    assert_eq!(collector.call_count(), 2);
    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn parallel_results_are_ordered_by_name() {
    let catalog: Catalog = [
        number_check("alpha", 1, 80),
        number_check("mike", 2, 40),
        number_check("zulu", 3, 0),
    ]
    .into_iter()
    .collect();
    let collector = RecordingCollector::new();
    let alerter = Alerter::default();
    let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

    let names = vec!["zulu".to_string(), "alpha".to_string(), "mike".to_string()];
    let results = dispatcher.dispatch_all(&names, true).await.expect("known");

    let finished = collector.finished.lock().expect("lock").clone();
    assert_eq!(finished, vec!["3", "2", "1"], "slowest check finishes last");
    let order: Vec<&str> = results.iter().map(|r| r.check.as_str()).collect();
    assert_eq!(order, vec!["alpha", "mike", "zulu"]);
}

// ---------------------------------------------------------------------------
// Binary exit codes
// ---------------------------------------------------------------------------

fn opsguard(args: &[&str]) -> std::process::Output {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").expect("empty config");
    Command::new(env!("CARGO_BIN_EXE_opsguard"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("run opsguard")
}

#[test]
fn binary_unknown_check_exits_one() {
    let output = opsguard(&["run", "no-such-check"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown check 'no-such-check'"));
}

#[test]
fn binary_invalid_invocation_exits_one() {
    let output = opsguard(&["not-a-command"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn binary_help_exits_zero() {
    let output = opsguard(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("check-ssl"));
}

#[test]
fn binary_list_json_is_parseable() {
    let output = opsguard(&["list", "--json"]);
    assert_eq!(output.status.code(), Some(0));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is pure JSON");
    assert_eq!(parsed.as_array().expect("array").len(), 25);
}

#[test]
fn binary_rejects_unsafe_domain() {
    let output = opsguard(&["check-ssl", "--domain", "example.com;reboot"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid domain"));
}
