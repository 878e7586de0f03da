#![allow(clippy::expect_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use opsguard::application::catalog::build_catalog;
use opsguard::application::config::AppConfig;
use opsguard::application::services::alerter::Alerter;
use opsguard::application::services::dispatcher::{exit_code, Dispatcher};
use opsguard::domain::entities::command::{CommandSpec, ProbeOutput};
use opsguard::domain::entities::result::CheckResult;
use opsguard::domain::ports::collector::{Collector, CollectorError};
use opsguard::domain::value_objects::CheckStatus;

// ---------------------------------------------------------------------------
// ScriptedCollector
// ---------------------------------------------------------------------------

type Reply = Box<dyn Fn(&CommandSpec) -> Result<ProbeOutput, CollectorError> + Send + Sync>;

/// Replies through a closure and records every command line it was given.
struct ScriptedCollector {
    reply: Reply,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCollector {
    fn new(
        reply: impl Fn(&CommandSpec) -> Result<ProbeOutput, CollectorError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Collector for ScriptedCollector {
    async fn run(&self, command: &CommandSpec) -> Result<ProbeOutput, CollectorError> {
        self.calls.lock().expect("lock").push(command.to_string());
        (self.reply)(command)
    }
}

async fn run_check(config: &AppConfig, collector: &ScriptedCollector, name: &str) -> CheckResult {
    let catalog = build_catalog(config).expect("valid catalog");
    let alerter = Alerter::default();
    let dispatcher = Dispatcher::new(&catalog, collector, &alerter);
    dispatcher.dispatch(name).await.expect("registered check")
}

fn failed(command: &CommandSpec, code: i32, stderr: &str) -> CollectorError {
    CollectorError::NonZeroExit {
        command: command.to_string(),
        code,
        stderr: stderr.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Disk usage
// ---------------------------------------------------------------------------

const DF_OUTPUT: &str = "\
Filesystem     1024-blocks      Used Available Capacity Mounted on
/dev/sda1         10000000   4000000   6000000      40% /
/dev/sdb1         10000000   8500000   1500000      85% /var
";

#[tokio::test]
async fn disk_at_85_percent_warns_naming_mount_point() {
    let collector = ScriptedCollector::new(|_| Ok(ProbeOutput::stdout(DF_OUTPUT)));
    let result = run_check(&AppConfig::default(), &collector, "disk-usage").await;

    assert_eq!(result.status, CheckStatus::Warn);
    assert!(result.message.contains("/var"), "{}", result.message);
    assert!(result.message.contains("85%"), "{}", result.message);
    assert!(!result.message.contains("sda1"));
    assert_eq!(exit_code(&[result]), 1);
}

#[tokio::test]
async fn monitor_reports_worst_of_its_probes() {
    let collector = ScriptedCollector::new(|command| match command.program.as_str() {
        "df" => Ok(ProbeOutput::stdout(DF_OUTPUT.replace("85%", "97%"))),
        "vmstat" => Ok(ProbeOutput::stdout(
            "procs -----------memory---------- ---swap-- -----io---- -system-- ------cpu-----\n \
             r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa st\n \
             1  0      0 800000  10000 200000    0    0     1     2   10   20  5  2 93  0  0\n \
             1  0      0 800000  10000 200000    0    0     0     0   12   25  4  1 95  0  0\n",
        )),
        _ => Ok(ProbeOutput::stdout(
            "MemTotal: 16000000 kB\nMemFree: 8000000 kB\nMemAvailable: 12000000 kB\n",
        )),
    });
    let result = run_check(&AppConfig::default(), &collector, "monitor").await;

    assert_eq!(result.status, CheckStatus::Critical);
    assert_eq!(collector.calls().len(), 3);
    assert!(result.message.contains("/var"));
}

#[tokio::test]
async fn unreadable_memory_figures_are_an_error_not_ok() {
    let collector = ScriptedCollector::new(|_| Ok(ProbeOutput::stdout("garbage\n")));
    let result = run_check(&AppConfig::default(), &collector, "memory-usage").await;
    assert_eq!(result.status, CheckStatus::Error);
}

// ---------------------------------------------------------------------------
// SSL expiry
// ---------------------------------------------------------------------------

fn ssl_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.ssl.domains = vec!["example.com".into()];
    config
}

fn enddate_in(days: i64) -> ProbeOutput {
    let expiry = Utc::now() + Duration::days(days) + Duration::hours(1);
    ProbeOutput::stdout(format!(
        "notAfter={}\n",
        expiry.format("%b %e %H:%M:%S %Y GMT")
    ))
}

#[tokio::test]
async fn certificate_with_10_days_left_alerts() {
    let collector = ScriptedCollector::new(|_| Ok(enddate_in(10)));
    let result = run_check(&ssl_config(), &collector, "check-ssl").await;

    assert!(
        matches!(result.status, CheckStatus::Warn | CheckStatus::Critical),
        "got {}",
        result.status
    );
    assert!(result.message.contains("example.com"));
    assert!(collector.calls()[0].contains("-connect example.com:443"));
}

#[tokio::test]
async fn certificate_with_45_days_left_is_ok() {
    let collector = ScriptedCollector::new(|_| Ok(enddate_in(45)));
    let result = run_check(&ssl_config(), &collector, "check-ssl").await;
    assert_eq!(result.status, CheckStatus::Ok);
}

#[tokio::test]
async fn certificate_inside_critical_window_is_critical() {
    let collector = ScriptedCollector::new(|_| Ok(enddate_in(3)));
    let result = run_check(&ssl_config(), &collector, "check-ssl").await;
    assert_eq!(result.status, CheckStatus::Critical);
}

// ---------------------------------------------------------------------------
// CI gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lint_failure_after_passing_tests_skips_build() {
    let collector = ScriptedCollector::new(|command| {
        if command.args.iter().any(|a| a == "lint") {
            Err(failed(command, 1, "3 problems"))
        } else {
            Ok(ProbeOutput::stdout("ok"))
        }
    });
    let result = run_check(&AppConfig::default(), &collector, "ci-checks").await;

    assert_eq!(result.status, CheckStatus::Critical);
    assert_eq!(result.skipped, vec!["build".to_string()]);
    assert!(result.message.starts_with("lint failed"));
    let calls = collector.calls();
    assert_eq!(calls, vec!["npm test", "npm run lint"]);
}

#[tokio::test]
async fn passing_pipeline_is_ok() {
    let collector = ScriptedCollector::new(|_| Ok(ProbeOutput::stdout("ok")));
    let result = run_check(&AppConfig::default(), &collector, "ci-checks").await;
    assert_eq!(result.status, CheckStatus::Ok);
    assert_eq!(collector.calls().len(), 3);
}

// ---------------------------------------------------------------------------
// Remediation
// ---------------------------------------------------------------------------

const STOPPED_INSTANCES: &str = r#"{
  "Reservations": [{
    "Instances": [
      {
        "InstanceId": "i-0old",
        "State": { "Name": "stopped" },
        "StateTransitionReason": "User initiated (2020-01-15 10:30:00 GMT)"
      },
      {
        "InstanceId": "i-0running",
        "State": { "Name": "running" }
      }
    ]
  }]
}"#;

fn aws_collector() -> ScriptedCollector {
    ScriptedCollector::new(|command| {
        if command.args.iter().any(|a| a == "describe-instances") {
            Ok(ProbeOutput::stdout(STOPPED_INSTANCES))
        } else {
            Ok(ProbeOutput::stdout("terminated"))
        }
    })
}

#[tokio::test]
async fn dry_run_issues_zero_action_commands() {
    let collector = aws_collector();
    let result = run_check(&AppConfig::default(), &collector, "cleanup-aws").await;

    assert_eq!(result.status, CheckStatus::Warn);
    assert_eq!(result.actions.len(), 1);
    assert!(!result.actions[0].executed);
    assert!(result.actions[0].command.contains("i-0old"));
    assert!(collector
        .calls()
        .iter()
        .all(|c| !c.contains("terminate-instances")));
}

#[tokio::test]
async fn execute_terminates_each_candidate_once() {
    let mut config = AppConfig::default();
    config.aws.dry_run = false;
    let collector = aws_collector();
    let result = run_check(&config, &collector, "cleanup-aws").await;

    assert_eq!(result.status, CheckStatus::Ok);
    let terminations: Vec<String> = collector
        .calls()
        .into_iter()
        .filter(|c| c.contains("terminate-instances"))
        .collect();
    assert_eq!(terminations.len(), 1);
    assert!(terminations[0].ends_with("--instance-ids i-0old"));
}

#[tokio::test]
async fn old_logs_are_deleted_recent_ones_kept() {
    let now = Utc::now().timestamp();
    let old = now - 40 * 86_400;
    let recent = now - 86_400;
    let listing = format!(
        "{old}.0000000000 /var/log/app/old.log\n{recent}.0000000000 /var/log/app/today.log\n"
    );
    let collector = ScriptedCollector::new(move |command| {
        if command.program == "find" {
            Ok(ProbeOutput::stdout(listing.clone()))
        } else {
            Ok(ProbeOutput::default())
        }
    });
    let result = run_check(&AppConfig::default(), &collector, "cleanup-logs").await;

    assert_eq!(result.status, CheckStatus::Ok);
    let removals: Vec<String> = collector
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("rm "))
        .collect();
    assert_eq!(removals, vec!["rm -f /var/log/app/old.log"]);
}

#[tokio::test]
async fn backup_failure_in_dump_skips_compress_and_prune() {
    let collector = ScriptedCollector::new(|command| {
        if command.program == "mysqldump" {
            Err(failed(command, 2, "Access denied for user 'backup'"))
        } else {
            Ok(ProbeOutput::default())
        }
    });
    let result = run_check(&AppConfig::default(), &collector, "backup-db").await;

    assert_eq!(result.status, CheckStatus::Critical);
    assert_eq!(result.skipped, vec!["compress".to_string(), "prune".to_string()]);
    assert!(result.message.contains("Access denied"));

    let calls = collector.calls();
    let dump = calls
        .iter()
        .find(|c| c.starts_with("mysqldump"))
        .and_then(|c| c.split("--result-file=").nth(1))
        .and_then(|rest| rest.split_whitespace().next())
        .expect("dump path")
        .to_string();
    assert_eq!(calls.last(), Some(&format!("rm -f {dump}")));
    assert!(calls.iter().all(|c| !c.starts_with("gzip")));
}
