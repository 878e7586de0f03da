use chrono::DateTime;

use crate::domain::entities::sample::{Sample, Value};

/// Parses `find ... -printf '%T@ %p\n'` into one `mtime` sample per file.
///
/// Paths may contain spaces; only the first field is the epoch.
#[must_use]
pub fn parse_file_times(stdout: &str) -> Vec<Sample> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| match line.trim().split_once(' ') {
            Some((epoch, path)) => {
                Sample::new("mtime", path.trim(), parse_epoch(epoch).unwrap_or(Value::Missing))
            }
            None => Sample::new("mtime", line.trim(), Value::Missing),
        })
        .collect()
}

fn parse_epoch(raw: &str) -> Option<Value> {
    let (secs, frac) = raw.split_once('.').unwrap_or((raw, "0"));
    let secs: i64 = secs.parse().ok()?;
    let digits: String = frac.chars().take(9).collect();
    let nanos: u32 = format!("{digits:0<9}").parse().ok()?;
    DateTime::from_timestamp(secs, nanos).map(Value::Timestamp)
}

/// Keeps only the most recent file. An empty listing stays empty.
#[must_use]
pub fn newest(samples: Vec<Sample>) -> Vec<Sample> {
    samples
        .into_iter()
        .filter(|s| matches!(s.value, Value::Timestamp(_)))
        .max_by_key(|s| match s.value {
            Value::Timestamp(t) => t.timestamp_nanos_opt().unwrap_or(i64::MIN),
            _ => i64::MIN,
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
1700000000.5000000000 /var/log/app/old.log
1700086400.0000000000 /var/log/app/with space.log
garbage
";

    #[test]
    fn each_file_becomes_a_sample() {
        let samples = parse_file_times(LISTING);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].subject, "/var/log/app/old.log");
        assert!(matches!(samples[0].value, Value::Timestamp(t) if t.timestamp() == 1_700_000_000));
        assert_eq!(samples[1].subject, "/var/log/app/with space.log");
        assert_eq!(samples[2].value, Value::Missing);
    }

    #[test]
    fn newest_keeps_latest_file() {
        let samples = newest(parse_file_times(LISTING));
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].subject, "/var/log/app/with space.log");
    }

    #[test]
    fn empty_listing_has_no_newest() {
        assert!(newest(parse_file_times("")).is_empty());
    }
}
