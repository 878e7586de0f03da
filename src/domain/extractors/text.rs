use crate::domain::entities::sample::{Sample, Value};

/// Number of non-empty lines (failed units, resolved addresses).
#[must_use]
pub fn line_count(stdout: &str, metric: &str, subject: &str) -> Vec<Sample> {
    #[allow(clippy::cast_precision_loss)]
    let count = stdout.lines().filter(|l| !l.trim().is_empty()).count() as f64;
    vec![Sample::new(metric, subject, Value::Number(count))]
}

/// Whole stdout as one trimmed text value; empty output is `Missing`.
#[must_use]
pub fn trimmed(stdout: &str, metric: &str, subject: &str) -> Vec<Sample> {
    let text = stdout.trim();
    let value = if text.is_empty() {
        Value::Missing
    } else {
        Value::text(text)
    };
    vec![Sample::new(metric, subject, value)]
}
