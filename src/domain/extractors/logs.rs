use crate::domain::entities::sample::{Sample, Value};

/// Counts lines matching the error and warning patterns.
///
/// A pattern is a `|`-separated list of case-insensitive substrings
/// (`error|fatal`). A line counts at most once, as an error when both match.
#[must_use]
pub fn count_levels(
    stdout: &str,
    subject: &str,
    error_pattern: &str,
    warn_pattern: &str,
) -> Vec<Sample> {
    let errors = alternatives(error_pattern);
    let warnings = alternatives(warn_pattern);

    let (mut error_count, mut warn_count) = (0_u32, 0_u32);
    for line in stdout.lines().map(str::to_lowercase) {
        if errors.iter().any(|p| line.contains(p.as_str())) {
            error_count += 1;
        } else if warnings.iter().any(|p| line.contains(p.as_str())) {
            warn_count += 1;
        }
    }

    vec![
        Sample::new("errors", subject, Value::Number(f64::from(error_count))),
        Sample::new("warnings", subject, Value::Number(f64::from(warn_count))),
    ]
}

fn alternatives(pattern: &str) -> Vec<String> {
    pattern
        .split('|')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
