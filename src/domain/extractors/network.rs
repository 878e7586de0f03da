use std::collections::BTreeSet;

use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

/// Reads the `N% packet loss` figure from `ping -c` output.
pub fn parse_packet_loss(stdout: &str, host: &str) -> Result<Vec<Sample>, EvaluationError> {
    let loss = stdout
        .split(',')
        .map(str::trim)
        .find_map(|part| part.strip_suffix("packet loss"))
        .ok_or_else(|| malformed("ping", "no packet loss summary"))?;
    Ok(vec![
        Sample::new("packet_loss", host, Value::parse_number(loss)).with_unit("%"),
    ])
}

/// Reports each expected TCP port as `listening` or `closed` from `ss -Htln`.
///
/// The local address is the fourth column (`0.0.0.0:22`, `[::]:443`, `*:80`).
#[must_use]
pub fn parse_listening(stdout: &str, expected: &[u16]) -> Vec<Sample> {
    let open: BTreeSet<u16> = stdout
        .lines()
        .filter_map(|line| {
            let local = line.split_whitespace().nth(3)?;
            local.rsplit_once(':')?.1.parse().ok()
        })
        .collect();

    expected
        .iter()
        .map(|port| {
            let state = if open.contains(port) {
                "listening"
            } else {
                "closed"
            };
            Sample::new("port", format!(":{port}"), Value::text(state))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn packet_loss_is_extracted() {
        let out = "\
PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.

--- 1.1.1.1 ping statistics ---
4 packets transmitted, 3 received, 25% packet loss, time 3004ms
";
        let samples = parse_packet_loss(out, "1.1.1.1").expect("parse");
        assert_eq!(samples[0].value, Value::Number(25.0));
        assert_eq!(samples[0].display_value(), "25%");
    }

    #[test]
    fn packet_loss_missing_summary_is_malformed() {
        assert!(parse_packet_loss("ping: unknown host", "nowhere").is_err());
    }

    #[test]
    fn listening_ports_are_matched() {
        let ss = "\
LISTEN 0      128          0.0.0.0:22        0.0.0.0:*
LISTEN 0      511             [::]:443          [::]:*
LISTEN 0      4096               *:8080            *:*
";
        let samples = parse_listening(ss, &[22, 443, 5432]);
        let states: Vec<String> = samples.iter().map(|s| s.value.to_string()).collect();
        assert_eq!(states, vec!["listening", "listening", "closed"]);
        assert_eq!(samples[2].subject, ":5432");
    }
}
