use serde::Deserialize;

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

#[derive(Debug, Deserialize)]
struct Audit {
    metadata: AuditMetadata,
}

#[derive(Debug, Deserialize)]
struct AuditMetadata {
    vulnerabilities: Vulnerabilities,
}

#[derive(Debug, Default, Deserialize)]
struct Vulnerabilities {
    #[serde(default)]
    critical: u32,
    #[serde(default)]
    high: u32,
    #[serde(default)]
    moderate: u32,
    #[serde(default)]
    low: u32,
}

/// Vulnerability counts per severity from `npm audit --json`.
pub fn parse_audit(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let audit: Audit = serde_json::from_str(stdout)
        .map_err(|e| malformed("npm audit", format!("invalid audit JSON: {e}")))?;
    let v = audit.metadata.vulnerabilities;
    Ok([
        ("critical", v.critical),
        ("high", v.high),
        ("moderate", v.moderate),
        ("low", v.low),
    ]
    .into_iter()
    .map(|(metric, count)| Sample::new(metric, "dependencies", Value::Number(f64::from(count))))
    .collect())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_severity() {
        let json = r#"{"auditReportVersion":2,"vulnerabilities":{},
            "metadata":{"vulnerabilities":{"info":0,"low":2,"moderate":1,"high":3,"critical":0,"total":6}}}"#;
        let samples = parse_audit(json).expect("parse");
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[1].metric, "high");
        assert_eq!(samples[1].value, Value::Number(3.0));
    }

    #[test]
    fn npm_error_output_is_malformed() {
        assert!(parse_audit("npm ERR! code ENOLOCK").is_err());
    }
}
