use serde::Deserialize;

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

// Minimal subset of the `kubectl -o json` list schema.

#[derive(Debug, Deserialize)]
struct List<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

impl Metadata {
    fn qualified(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Node {
    metadata: Metadata,
    #[serde(default)]
    status: NodeStatus,
}

#[derive(Debug, Default, Deserialize)]
struct NodeStatus {
    #[serde(default)]
    conditions: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: Metadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatus {
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    restart_count: u32,
    #[serde(default)]
    state: Option<ContainerState>,
}

#[derive(Debug, Deserialize)]
struct ContainerState {
    #[serde(default)]
    waiting: Option<Waiting>,
}

#[derive(Debug, Deserialize)]
struct Waiting {
    #[serde(default)]
    reason: Option<String>,
}

fn parse_list<T: for<'de> Deserialize<'de>>(stdout: &str) -> Result<Vec<T>, EvaluationError> {
    serde_json::from_str::<List<T>>(stdout)
        .map(|list| list.items)
        .map_err(|e| malformed("kubectl", format!("invalid list JSON: {e}")))
}

/// `ready` per node: the status of its `Ready` condition (`True`, `False`, `Unknown`).
pub fn parse_nodes(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let nodes: Vec<Node> = parse_list(stdout)?;
    Ok(nodes
        .into_iter()
        .map(|node| {
            let value = node
                .status
                .conditions
                .iter()
                .find(|c| c.kind == "Ready")
                .map_or(Value::Missing, |c| Value::text(c.status.clone()));
            Sample::new("ready", node.metadata.name, value)
        })
        .collect())
}

/// `pod_health` per pod: `ok` when succeeded or running with every container
/// ready; otherwise the most specific reason available.
pub fn parse_pod_health(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let pods: Vec<Pod> = parse_list(stdout)?;
    Ok(pods
        .into_iter()
        .map(|pod| {
            let health = pod_health(&pod.status);
            Sample::new("pod_health", pod.metadata.qualified(), Value::Text(health))
        })
        .collect())
}

fn pod_health(status: &PodStatus) -> String {
    let waiting_reason = status
        .container_statuses
        .iter()
        .filter_map(|c| c.state.as_ref()?.waiting.as_ref()?.reason.clone())
        .next();
    if let Some(reason) = waiting_reason {
        return reason;
    }

    match status.phase.as_deref() {
        Some("Succeeded") => "ok".to_string(),
        Some("Running") if status.container_statuses.iter().all(|c| c.ready) => {
            "ok".to_string()
        }
        Some("Running") => "not-ready".to_string(),
        Some(phase) => phase.to_lowercase(),
        None => "unknown".to_string(),
    }
}

/// `restarts` per pod: sum of container restart counts.
pub fn parse_restarts(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let pods: Vec<Pod> = parse_list(stdout)?;
    Ok(pods
        .into_iter()
        .map(|pod| {
            let restarts: u32 = pod
                .status
                .container_statuses
                .iter()
                .map(|c| c.restart_count)
                .sum();
            Sample::new(
                "restarts",
                pod.metadata.qualified(),
                Value::Number(f64::from(restarts)),
            )
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    const NODES: &str = r#"{"items":[
        {"metadata":{"name":"node-a"},"status":{"conditions":[
            {"type":"MemoryPressure","status":"False"},{"type":"Ready","status":"True"}]}},
        {"metadata":{"name":"node-b"},"status":{"conditions":[{"type":"Ready","status":"Unknown"}]}},
        {"metadata":{"name":"node-c"},"status":{}}
    ]}"#;

    const PODS: &str = r#"{"items":[
        {"metadata":{"name":"api-1","namespace":"prod"},
         "status":{"phase":"Running","containerStatuses":[{"ready":true,"restartCount":0}]}},
        {"metadata":{"name":"api-2","namespace":"prod"},
         "status":{"phase":"Running","containerStatuses":[{"ready":false,"restartCount":7,
            "state":{"waiting":{"reason":"CrashLoopBackOff"}}}]}},
        {"metadata":{"name":"migrate","namespace":"prod"},"status":{"phase":"Succeeded"}},
        {"metadata":{"name":"batch","namespace":"jobs"},
         "status":{"phase":"Running","containerStatuses":[{"ready":false,"restartCount":1}]}},
        {"metadata":{"name":"queued","namespace":"jobs"},"status":{"phase":"Pending"}}
    ]}"#;

    #[test]
    fn nodes_report_ready_condition() {
        let samples = parse_nodes(NODES).expect("parse");
        assert_eq!(samples[0].value, Value::text("True"));
        assert_eq!(samples[1].value, Value::text("Unknown"));
        assert_eq!(samples[2].value, Value::Missing);
    }

    #[test]
    fn pod_health_classifies_each_pod() {
        let samples = parse_pod_health(PODS).expect("parse");
        let health: Vec<(String, String)> = samples
            .iter()
            .map(|s| (s.subject.clone(), s.value.to_string()))
            .collect();
        assert_eq!(
            health,
            vec![
                ("prod/api-1".to_string(), "ok".to_string()),
                ("prod/api-2".to_string(), "CrashLoopBackOff".to_string()),
                ("prod/migrate".to_string(), "ok".to_string()),
                ("jobs/batch".to_string(), "not-ready".to_string()),
                ("jobs/queued".to_string(), "pending".to_string()),
            ]
        );
    }

    #[test]
    fn restarts_are_summed() {
        let samples = parse_restarts(PODS).expect("parse");
        assert_eq!(samples[1].subject, "prod/api-2");
        assert_eq!(samples[1].value, Value::Number(7.0));
    }

    #[test]
    fn error_text_is_malformed() {
        assert!(parse_nodes("The connection to the server was refused").is_err());
    }
}
