use std::collections::HashMap;

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

fn round1(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

/// Parses `/proc/meminfo` into `memory_used` (and `swap_used` when swap exists).
pub fn parse_meminfo(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let fields: HashMap<&str, f64> = stdout
        .lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let kb = rest.split_whitespace().next()?.parse::<f64>().ok()?;
            Some((key.trim(), kb))
        })
        .collect();

    let total = *fields
        .get("MemTotal")
        .ok_or_else(|| malformed("meminfo", "MemTotal not found"))?;
    let available = *fields
        .get("MemAvailable")
        .ok_or_else(|| malformed("meminfo", "MemAvailable not found"))?;
    if total <= 0.0 {
        return Err(malformed("meminfo", "MemTotal is zero"));
    }

    let mut samples = vec![
        Sample::new(
            "memory_used",
            "memory",
            Value::Number(round1((total - available) / total * 100.0)),
        )
        .with_unit("%"),
    ];

    if let (Some(&swap_total), Some(&swap_free)) =
        (fields.get("SwapTotal"), fields.get("SwapFree"))
    {
        if swap_total > 0.0 {
            samples.push(
                Sample::new(
                    "swap_used",
                    "swap",
                    Value::Number(round1((swap_total - swap_free) / swap_total * 100.0)),
                )
                .with_unit("%"),
            );
        }
    }

    Ok(samples)
}

/// Parses `vmstat 1 2`: CPU usage is `100 - id` from the last report line.
/// The first report line is the since-boot average and is ignored.
pub fn parse_vmstat(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    let header_pos = lines
        .iter()
        .position(|l| l.split_whitespace().any(|f| f == "id"))
        .ok_or_else(|| malformed("vmstat", "no column header with 'id'"))?;
    let idle_col = lines[header_pos]
        .split_whitespace()
        .position(|f| f == "id")
        .ok_or_else(|| malformed("vmstat", "no 'id' column"))?;

    let last = lines
        .get(header_pos + 1..)
        .and_then(<[&str]>::last)
        .ok_or_else(|| malformed("vmstat", "no report line"))?;

    let value = match last.split_whitespace().nth(idle_col).map(Value::parse_number) {
        Some(Value::Number(idle)) => Value::Number((100.0 - idle).clamp(0.0, 100.0)),
        _ => Value::Missing,
    };
    Ok(vec![Sample::new("cpu_used", "cpu", value).with_unit("%")])
}

/// Parses `/proc/loadavg` into `load_1m`, `load_5m`, `load_15m`.
pub fn parse_loadavg(stdout: &str) -> Result<Vec<Sample>, EvaluationError> {
    let fields: Vec<&str> = stdout.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(malformed(
            "loadavg",
            format!("expected 3 load figures, got '{}'", stdout.trim()),
        ));
    }
    Ok(["load_1m", "load_5m", "load_15m"]
        .iter()
        .zip(&fields)
        .map(|(metric, raw)| Sample::new(*metric, "host", Value::parse_number(raw)))
        .collect())
}

/// Counts processes in state `Z` from `ps -eo stat=,pid=,comm=`.
#[must_use]
pub fn parse_zombies(stdout: &str) -> Vec<Sample> {
    let zombies: Vec<String> = stdout
        .lines()
        .filter(|l| l.trim_start().starts_with('Z'))
        .filter_map(|l| {
            let mut parts = l.split_whitespace().skip(1);
            let pid = parts.next()?;
            let comm = parts.next().unwrap_or("?");
            Some(format!("{comm}({pid})"))
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let count = zombies.len() as f64;
    let subject = if zombies.is_empty() {
        "processes".to_string()
    } else {
        zombies.join(", ")
    };
    vec![Sample::new("zombies", subject, Value::Number(count))]
}
