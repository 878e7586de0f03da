use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

/// Parses `notAfter=Mar 15 12:00:00 2025 GMT` into `days_left` for `domain`.
pub fn parse_enddate(
    stdout: &str,
    domain: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Sample>, EvaluationError> {
    let raw = stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix("notAfter="))
        .ok_or_else(|| malformed("openssl", format!("no notAfter line for {domain}")))?;

    let value = parse_openssl_date(raw).map_or(Value::Missing, |expiry| {
        #[allow(clippy::cast_precision_loss)]
        let days = (expiry - now).num_days() as f64;
        Value::Number(days)
    });
    Ok(vec![Sample::new("days_left", domain, value).with_unit(" days")])
}

/// OpenSSL pads single-digit days with a second space (`Mar  5`).
fn parse_openssl_date(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_zone = normalized.strip_suffix(" GMT").unwrap_or(&normalized);
    NaiveDateTime::parse_from_str(without_zone, "%b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn computes_days_left() {
        let samples =
            parse_enddate("notAfter=Mar 11 12:00:00 2025 GMT\n", "example.com", now())
                .expect("parse");
        assert_eq!(samples[0].subject, "example.com");
        assert_eq!(samples[0].value, Value::Number(10.0));
        assert_eq!(samples[0].display_value(), "10 days");
    }

    #[test]
    fn handles_space_padded_day() {
        let samples = parse_enddate("notAfter=Apr  5 12:00:00 2025 GMT", "example.com", now())
            .expect("parse");
        assert_eq!(samples[0].value, Value::Number(35.0));
    }

    #[test]
    fn expired_certificate_is_negative() {
        let samples = parse_enddate("notAfter=Feb 19 12:00:00 2025 GMT", "old.example", now())
            .expect("parse");
        assert_eq!(samples[0].value, Value::Number(-10.0));
    }

    #[test]
    fn unparseable_date_is_missing() {
        let samples =
            parse_enddate("notAfter=someday", "example.com", now()).expect("parse");
        assert_eq!(samples[0].value, Value::Missing);
    }

    #[test]
    fn missing_enddate_is_malformed() {
        assert!(parse_enddate("unable to load certificate", "example.com", now()).is_err());
    }
}
