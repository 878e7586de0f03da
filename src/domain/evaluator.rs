//! Pure threshold evaluation: value + rule in, status out. No I/O.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::result::Finding;
use crate::domain::entities::rule::{Limit, ThresholdRule};
use crate::domain::entities::sample::{Sample, Value};
use crate::domain::value_objects::comparator::Comparator;
use crate::domain::value_objects::status::CheckStatus;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("no value for {0}")]
    Missing(String),
    #[error("malformed value for {metric}: {reason}")]
    Malformed { metric: String, reason: String },
    #[error("{comparator} cannot compare {value} against {limit}")]
    Incompatible {
        comparator: Comparator,
        value: String,
        limit: String,
    },
}

/// Evaluates one value against one rule.
///
/// # Errors
///
/// Returns `EvaluationError` when the value is missing, cannot be read as
/// the type the comparator needs, or the rule's limit has the wrong type.
pub fn try_evaluate(
    value: &Value,
    rule: &ThresholdRule,
    now: DateTime<Utc>,
) -> Result<CheckStatus, EvaluationError> {
    if let Some(critical) = &rule.critical {
        if breaches(value, critical, rule, now)? {
            return Ok(CheckStatus::Critical);
        }
    }
    if breaches(value, &rule.warn, rule, now)? {
        return Ok(CheckStatus::Warn);
    }
    Ok(CheckStatus::Ok)
}

/// Evaluates one value against one rule; anything unreadable is `Error`,
/// never `Ok`.
#[must_use]
pub fn evaluate(value: &Value, rule: &ThresholdRule, now: DateTime<Utc>) -> CheckStatus {
    try_evaluate(value, rule, now).unwrap_or(CheckStatus::Error)
}

fn breaches(
    value: &Value,
    limit: &Limit,
    rule: &ThresholdRule,
    now: DateTime<Utc>,
) -> Result<bool, EvaluationError> {
    if matches!(value, Value::Missing) {
        return Err(EvaluationError::Missing(rule.metric.clone()));
    }

    match rule.comparator {
        Comparator::Gt | Comparator::Lt => {
            let observed = numeric(value, &rule.metric)?;
            let Limit::Number(bound) = limit else {
                return Err(incompatible(rule.comparator, value, limit));
            };
            Ok(if rule.comparator == Comparator::Gt {
                observed > *bound
            } else {
                observed < *bound
            })
        }
        Comparator::Contains => {
            let needle = limit_text(limit);
            Ok(textual(value, rule)?.contains(needle.as_str()))
        }
        Comparator::NotEqual => {
            let expected = limit_text(limit);
            Ok(textual(value, rule)?.trim() != expected.trim())
        }
        Comparator::AgeExceeds => {
            let since = timestamp(value, &rule.metric)?;
            let Limit::Number(days) = limit else {
                return Err(incompatible(rule.comparator, value, limit));
            };
            #[allow(clippy::cast_precision_loss)]
            let age_secs = (now - since).num_seconds() as f64;
            Ok(age_secs > days * SECONDS_PER_DAY)
        }
    }
}

fn numeric(value: &Value, metric: &str) -> Result<f64, EvaluationError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Text(raw) => match Value::parse_number(raw) {
            Value::Number(n) => Ok(n),
            _ => Err(EvaluationError::Malformed {
                metric: metric.to_string(),
                reason: format!("'{raw}' is not a number"),
            }),
        },
        Value::Timestamp(_) | Value::Missing => Err(EvaluationError::Malformed {
            metric: metric.to_string(),
            reason: format!("expected a number, got {value}"),
        }),
    }
}

fn textual(value: &Value, rule: &ThresholdRule) -> Result<String, EvaluationError> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Number(n) => Ok(value_number_text(*n)),
        Value::Timestamp(_) | Value::Missing => Err(EvaluationError::Incompatible {
            comparator: rule.comparator,
            value: value.to_string(),
            limit: rule.warn.to_string(),
        }),
    }
}

fn timestamp(value: &Value, metric: &str) -> Result<DateTime<Utc>, EvaluationError> {
    match value {
        Value::Timestamp(ts) => Ok(*ts),
        Value::Text(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| EvaluationError::Malformed {
                metric: metric.to_string(),
                reason: format!("'{raw}' is not a timestamp: {e}"),
            }),
        Value::Number(_) | Value::Missing => Err(EvaluationError::Malformed {
            metric: metric.to_string(),
            reason: format!("expected a timestamp, got {value}"),
        }),
    }
}

fn limit_text(limit: &Limit) -> String {
    match limit {
        Limit::Text(s) => s.clone(),
        Limit::Number(n) => value_number_text(*n),
    }
}

fn value_number_text(n: f64) -> String {
    Value::Number(n).to_string()
}

fn incompatible(comparator: Comparator, value: &Value, limit: &Limit) -> EvaluationError {
    EvaluationError::Incompatible {
        comparator,
        value: value.to_string(),
        limit: limit.to_string(),
    }
}

/// Aggregate verdict over every sample of a probe.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    pub status: CheckStatus,
    pub findings: Vec<Finding>,
}

impl Judgement {
    /// Messages of every non-OK finding, joined; a short all-clear otherwise.
    #[must_use]
    pub fn message(&self) -> String {
        let problems: Vec<&str> = self
            .findings
            .iter()
            .filter(|f| !f.status.is_ok())
            .map(|f| f.message.as_str())
            .collect();
        if problems.is_empty() {
            format!("{} sample(s) within limits", self.findings.len())
        } else {
            problems.join("; ")
        }
    }
}

/// Applies every rule to the samples of its metric. Status is the worst
/// over all findings.
#[must_use]
pub fn judge(samples: &[Sample], rules: &[ThresholdRule], now: DateTime<Utc>) -> Judgement {
    let mut findings = Vec::new();

    for rule in rules {
        let mut matched = 0usize;
        for sample in samples.iter().filter(|s| s.metric == rule.metric) {
            matched += 1;
            findings.push(finding_for(sample, rule, now));
        }
        if matched == 0 && rule.require_samples {
            findings.push(Finding::new(
                rule.metric.clone(),
                CheckStatus::Error,
                format!("no {} samples found", rule.metric),
            ));
        }
    }

    Judgement {
        status: CheckStatus::worst(findings.iter().map(|f| f.status)),
        findings,
    }
}

fn finding_for(sample: &Sample, rule: &ThresholdRule, now: DateTime<Utc>) -> Finding {
    match try_evaluate(&sample.value, rule, now) {
        Ok(CheckStatus::Ok) => Finding::new(
            sample.subject.clone(),
            CheckStatus::Ok,
            format!(
                "{}: {} {}",
                sample.subject,
                sample.metric,
                sample.display_value()
            ),
        ),
        Ok(status) => {
            let breached = match (status, &rule.critical) {
                (CheckStatus::Critical, Some(critical)) => critical,
                _ => &rule.warn,
            };
            Finding::new(
                sample.subject.clone(),
                status,
                format!(
                    "{}: {} {} {} {}",
                    sample.subject,
                    sample.metric,
                    sample.display_value(),
                    rule.comparator.symbol(),
                    render_limit(breached, rule.comparator, &sample.unit)
                ),
            )
        }
        Err(e) => Finding::new(
            sample.subject.clone(),
            CheckStatus::Error,
            format!("{}: {e}", sample.subject),
        ),
    }
}

fn render_limit(limit: &Limit, comparator: Comparator, unit: &str) -> String {
    match (limit, comparator) {
        (Limit::Number(n), Comparator::AgeExceeds) => {
            format!("{} days", Value::Number(*n))
        }
        (Limit::Number(n), _) => format!("{}{unit}", Value::Number(*n)),
        (Limit::Text(_), _) => limit.to_string(),
    }
}
