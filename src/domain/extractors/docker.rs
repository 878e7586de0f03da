use serde::Deserialize;

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

/// One line of `docker ps -a --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerRow {
    names: String,
    /// Absent before Docker 20.10; derived from `Status` then
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    status: String,
}

impl ContainerRow {
    fn state(&self) -> String {
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            return state.to_lowercase();
        }
        let status = self.status.to_lowercase();
        if status.starts_with("up") {
            "running".to_string()
        } else if status.starts_with("exited") {
            "exited".to_string()
        } else if status.starts_with("created") {
            "created".to_string()
        } else {
            status
        }
    }
}

/// One line of `docker system df --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DiskUsageRow {
    #[serde(rename = "Type")]
    kind: String,
    reclaimable: String,
}

fn json_lines<T: for<'de> Deserialize<'de>>(
    stdout: &str,
    tool: &str,
) -> Result<Vec<T>, EvaluationError> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            serde_json::from_str(l).map_err(|e| malformed(tool, format!("invalid JSON line: {e}")))
        })
        .collect()
}

/// Emits `state` and `status` per container. When `required` is non-empty,
/// only those containers are reported and absent ones get state `absent`.
pub fn parse_containers(
    stdout: &str,
    required: &[String],
) -> Result<Vec<Sample>, EvaluationError> {
    let rows: Vec<ContainerRow> = json_lines(stdout, "docker ps")?;

    let mut samples = Vec::new();
    if required.is_empty() {
        for row in &rows {
            push_container(&mut samples, row);
        }
    } else {
        for name in required {
            match rows.iter().find(|r| r.names.split(',').any(|n| n == name)) {
                Some(row) => push_container(&mut samples, row),
                None => samples.push(Sample::new("state", name.clone(), Value::text("absent"))),
            }
        }
    }
    Ok(samples)
}

fn push_container(samples: &mut Vec<Sample>, row: &ContainerRow) {
    samples.push(Sample::new("state", row.names.clone(), Value::Text(row.state())));
    samples.push(Sample::new(
        "status",
        row.names.clone(),
        Value::text(row.status.clone()),
    ));
}

/// Reclaimable percentage per resource type (`Images`, `Containers`, ...).
pub fn parse_system_df(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let rows: Vec<DiskUsageRow> = json_lines(stdout, "docker system df")?;
    Ok(rows
        .into_iter()
        .map(|row| {
            Sample::new("reclaimable", row.kind, reclaimable_percent(&row.reclaimable))
                .with_unit("%")
        })
        .collect())
}

/// `"1.2GB (45%)"` → 45, `"0B"` → 0.
fn reclaimable_percent(raw: &str) -> Value {
    match raw.split_once('(') {
        Some((_, rest)) => Value::parse_number(rest.trim_end_matches(')')),
        None if raw.trim().starts_with('0') => Value::Number(0.0),
        None => Value::Missing,
    }
}
