use std::io::{self, Write};

use colored::Colorize;

use crate::domain::entities::result::CheckResult;
use crate::domain::value_objects::status::CheckStatus;

/// Strips ANSI/OSC escape sequences from a string to prevent terminal injection.
///
/// Messages and values carry text captured from external tools.
fn sanitize_terminal(input: &str) -> String {
    input.chars().filter(|c| *c != '\x1b').collect()
}

#[must_use]
pub fn status_badge(status: CheckStatus) -> String {
    let label = format!(" {status} ");
    match status {
        CheckStatus::Critical => format!("{}", label.on_red().white().bold()),
        CheckStatus::Error => format!("{}", label.on_magenta().white().bold()),
        CheckStatus::Warn => format!("{}", label.on_yellow().black().bold()),
        CheckStatus::Ok => format!("{}", label.on_green().black()),
    }
}

/// Bold title underlined to its display width.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_section_header(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "{}", title.bold().cyan())?;
    writeln!(out, "{}", "─".repeat(title.chars().count()).cyan())
}

/// Human-readable block for one result: badge line, value, then every
/// finding that is not OK, skipped steps and remediation actions.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_result(out: &mut impl Write, result: &CheckResult) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {}",
        status_badge(result.status),
        result.check.bold(),
        sanitize_terminal(&result.message)
    )?;
    if let Some(value) = &result.value {
        writeln!(out, "  {}", sanitize_terminal(value).dimmed())?;
    }
    for finding in result.findings.iter().filter(|f| !f.status.is_ok()) {
        writeln!(
            out,
            "  {} {}: {}",
            format!("[{}]", finding.status).yellow(),
            sanitize_terminal(&finding.subject),
            sanitize_terminal(&finding.message)
        )?;
    }
    if !result.skipped.is_empty() {
        writeln!(out, "  skipped: {}", result.skipped.join(", ").dimmed())?;
    }
    for action in &result.actions {
        let marker = if !action.executed {
            "would run".cyan()
        } else if action.success {
            "ran".green()
        } else {
            "failed".red().bold()
        };
        writeln!(out, "  {marker} {}", sanitize_terminal(&action.command))?;
    }
    Ok(())
}

/// Writes every result, then a one-line tally. With `json`, writes a single
/// JSON array instead.
///
/// # Errors
///
/// Returns an error if writing to `out` or JSON serialization fails.
pub fn write_results(out: &mut impl Write, results: &[CheckResult], json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, results)?;
        return writeln!(out);
    }

    for result in results {
        write_result(out, result)?;
    }
    if results.len() > 1 {
        writeln!(out)?;
        writeln!(out, "{}", tally(results))?;
    }
    Ok(())
}

fn tally(results: &[CheckResult]) -> String {
    let count = |status: CheckStatus| results.iter().filter(|r| r.status == status).count();
    format!(
        "{} check(s): {} ok, {} warn, {} error, {} critical",
        results.len(),
        count(CheckStatus::Ok),
        count(CheckStatus::Warn),
        count(CheckStatus::Error),
        count(CheckStatus::Critical)
    )
}
