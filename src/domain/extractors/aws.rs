use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstances {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Instance {
    instance_id: String,
    state: InstanceState,
    #[serde(default)]
    state_transition_reason: Option<String>,
    #[serde(default)]
    launch_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceState {
    name: String,
}

/// `stopped_since` per stopped instance.
///
/// The stop time comes from `StateTransitionReason`
/// (`User initiated (2024-01-15 10:30:00 GMT)`); when absent, `LaunchTime`
/// is the best lower bound available.
pub fn parse_stopped_instances(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let parsed: DescribeInstances = serde_json::from_str(stdout)
        .map_err(|e| malformed("aws ec2", format!("invalid describe-instances JSON: {e}")))?;

    Ok(parsed
        .reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .filter(|i| i.state.name == "stopped")
        .map(|instance| {
            let since = instance
                .state_transition_reason
                .as_deref()
                .and_then(parse_transition_time)
                .or_else(|| {
                    instance
                        .launch_time
                        .as_deref()
                        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                        .map(|t| t.with_timezone(&Utc))
                });
            Sample::new(
                "stopped_since",
                instance.instance_id,
                since.map_or(Value::Missing, Value::Timestamp),
            )
        })
        .collect())
}

fn parse_transition_time(reason: &str) -> Option<DateTime<Utc>> {
    let inner = reason.split_once('(')?.1.split_once(')')?.0;
    let without_zone = inner.trim().strip_suffix(" GMT")?;
    NaiveDateTime::parse_from_str(without_zone, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
