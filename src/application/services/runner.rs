use chrono::{DateTime, Utc};

use crate::domain::entities::check::{CheckDefinition, CheckPlan, Probe, Remediation, Step};
use crate::domain::entities::command::CommandSpec;
use crate::domain::entities::result::{ActionTaken, CheckResult, Finding};
use crate::domain::entities::sample::Sample;
use crate::domain::evaluator::{judge, Judgement};
use crate::domain::ports::collector::{Collector, CollectorError};
use crate::domain::value_objects::status::CheckStatus;

/// Executes check plans: collect → extract → evaluate, and act for remediations.
///
/// Never fails: collector and evaluation errors become `ERROR` findings so a
/// single broken probe cannot abort a batch.
pub struct CheckRunner<'a> {
    collector: &'a dyn Collector,
}

/// What one probe observed and how it was judged.
struct ProbeReport {
    samples: Vec<Sample>,
    judgement: Judgement,
}

impl<'a> CheckRunner<'a> {
    #[must_use]
    pub fn new(collector: &'a dyn Collector) -> Self {
        Self { collector }
    }

    /// Runs one check once. The same `now` is used for every command
    /// rendering and age comparison of the run.
    pub async fn run(&self, definition: &CheckDefinition) -> CheckResult {
        let now = Utc::now();
        let mut result = match &definition.plan {
            CheckPlan::Probe(probe) => self.run_probes(std::slice::from_ref(probe), now).await,
            CheckPlan::Composite(probes) => self.run_probes(probes, now).await,
            CheckPlan::Sequence(steps) => self.run_sequence(steps, now).await,
            CheckPlan::Remediate(remediation) => self.run_remediation(remediation, now).await,
        };
        result.check.clone_from(&definition.name);
        result.timestamp = now;
        result
    }

    async fn probe(&self, probe: &Probe, now: DateTime<Utc>) -> ProbeReport {
        let command = probe.command.render(None, now);
        tracing::debug!(probe = %probe.label, command = %command, "running probe");

        let failed = |message: String| ProbeReport {
            samples: Vec::new(),
            judgement: Judgement {
                status: CheckStatus::Error,
                findings: vec![Finding::new(probe.label.clone(), CheckStatus::Error, message)],
            },
        };

        let output = match self.collector.run(&command).await {
            Ok(output) => output,
            Err(e) => return failed(format!("{}: {e}", probe.label)),
        };
        match probe.extractor.extract(&output, now) {
            Ok(samples) => {
                let judgement = judge(&samples, &probe.rules, now);
                ProbeReport { samples, judgement }
            }
            Err(e) => failed(format!("{}: {e}", probe.label)),
        }
    }

    async fn run_probes(&self, probes: &[Probe], now: DateTime<Utc>) -> CheckResult {
        if probes.is_empty() {
            return CheckResult::new("", CheckStatus::Ok, "nothing configured to check");
        }

        let mut samples = Vec::new();
        let mut findings = Vec::new();
        for probe in probes {
            let report = self.probe(probe, now).await;
            samples.extend(report.samples);
            findings.extend(report.judgement.findings);
        }

        let judgement = Judgement {
            status: CheckStatus::worst(findings.iter().map(|f| f.status)),
            findings,
        };
        let mut result = CheckResult::new("", judgement.status, judgement.message());
        result.value = render_samples(&samples);
        result.findings = judgement.findings;
        result
    }

    async fn run_sequence(&self, steps: &[Step], now: DateTime<Utc>) -> CheckResult {
        let mut findings = Vec::new();

        for (index, step) in steps.iter().enumerate() {
            let command = step.command.render(None, now);
            tracing::info!(step = %step.label, command = %command, "running step");

            match self.collector.run(&command).await {
                Ok(output) => findings.push(Finding::new(
                    step.label.clone(),
                    CheckStatus::Ok,
                    format!("{} ok ({:.1}s)", step.label, output.elapsed.as_secs_f64()),
                )),
                Err(e) => {
                    if let Some(cleanup) = &step.on_failure {
                        self.clean_up(step, cleanup, now).await;
                    }
                    let status = step_failure_status(&e);
                    let skipped: Vec<String> =
                        steps[index + 1..].iter().map(|s| s.label.clone()).collect();
                    let mut message = format!("{} failed: {e}", step.label);
                    if !skipped.is_empty() {
                        message.push_str(&format!("; skipped: {}", skipped.join(", ")));
                    }
                    findings.push(Finding::new(step.label.clone(), status, message.clone()));

                    let mut result = CheckResult::new("", status, message);
                    result.findings = findings;
                    result.skipped = skipped;
                    return result;
                }
            }
        }

        let mut result = CheckResult::new(
            "",
            CheckStatus::Ok,
            format!("all {} step(s) succeeded", steps.len()),
        );
        result.findings = findings;
        result
    }

    /// Best effort: a failing cleanup is logged and does not change the verdict.
    async fn clean_up(&self, step: &Step, cleanup: &CommandSpec, now: DateTime<Utc>) {
        let command = cleanup.render(None, now);
        tracing::info!(step = %step.label, command = %command, "cleaning up failed step");
        if let Err(e) = self.collector.run(&command).await {
            tracing::warn!(step = %step.label, "cleanup failed: {e}");
        }
    }

    async fn run_remediation(&self, remediation: &Remediation, now: DateTime<Utc>) -> CheckResult {
        let report = self.probe(&remediation.probe, now).await;
        let findings = report.judgement.findings;

        // Unreadable subjects are reported but never acted upon
        let unreadable = CheckStatus::worst(
            findings
                .iter()
                .filter(|f| f.status == CheckStatus::Error)
                .map(|f| f.status),
        );
        let candidates: Vec<&Finding> = findings
            .iter()
            .filter(|f| matches!(f.status, CheckStatus::Warn | CheckStatus::Critical))
            .collect();

        let (status, message, actions) = if candidates.is_empty() {
            (CheckStatus::Ok, "no candidates found".to_string(), Vec::new())
        } else if remediation.dry_run {
            let actions = candidates
                .iter()
                .map(|c| ActionTaken {
                    subject: c.subject.clone(),
                    command: remediation.action.render(Some(&c.subject), now).to_string(),
                    executed: false,
                    success: false,
                    output: String::new(),
                })
                .collect();
            (
                CheckStatus::Warn,
                format!("dry run: {} candidate(s) would be remediated", candidates.len()),
                actions,
            )
        } else {
            self.remediate(remediation, &candidates, now).await
        };

        let mut result = CheckResult::new("", status.max(unreadable), message);
        result.value = render_samples(&report.samples);
        result.findings = findings;
        result.actions = actions;
        result
    }

    async fn remediate(
        &self,
        remediation: &Remediation,
        candidates: &[&Finding],
        now: DateTime<Utc>,
    ) -> (CheckStatus, String, Vec<ActionTaken>) {
        let mut actions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let command = remediation.action.render(Some(&candidate.subject), now);
            tracing::info!(subject = %candidate.subject, command = %command, "remediating");
            let (success, output) = match self.collector.run(&command).await {
                Ok(out) => (true, out.stdout.trim().to_string()),
                Err(e) => {
                    tracing::warn!(subject = %candidate.subject, "remediation failed: {e}");
                    (false, e.to_string())
                }
            };
            actions.push(ActionTaken {
                subject: candidate.subject.clone(),
                command: command.to_string(),
                executed: true,
                success,
                output,
            });
        }

        let failures = actions.iter().filter(|a| !a.success).count();
        if failures == 0 {
            (
                CheckStatus::Ok,
                format!("remediated {} candidate(s)", actions.len()),
                actions,
            )
        } else {
            (
                CheckStatus::Error,
                format!("{failures} of {} remediation action(s) failed", actions.len()),
                actions,
            )
        }
    }
}

/// A step that ran and reported failure is a confirmed problem; one that
/// could not run at all leaves the outcome unknown.
const fn step_failure_status(error: &CollectorError) -> CheckStatus {
    match error {
        CollectorError::NonZeroExit { .. } => CheckStatus::Critical,
        CollectorError::Spawn { .. } | CollectorError::Timeout { .. } => CheckStatus::Error,
    }
}

fn render_samples(samples: &[Sample]) -> Option<String> {
    if samples.is_empty() {
        return None;
    }
    Some(
        samples
            .iter()
            .map(|s| format!("{} {}={}", s.subject, s.metric, s.display_value()))
            .collect::<Vec<_>>()
            .join(", "),
    )
}
