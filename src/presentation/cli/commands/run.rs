use std::io::Write;

use crate::application::catalog::Catalog;
use crate::application::services::dispatcher::{exit_code, Dispatcher};
use crate::presentation::cli::formatters::result_fmt::write_results;

/// Names selected by `run --all`: every check that only observes.
/// Sequences (deploy, backups, CI) and remediations must be named explicitly.
#[must_use]
pub fn all_read_only(catalog: &Catalog) -> Vec<String> {
    catalog
        .iter()
        .filter(|c| c.plan.is_read_only())
        .map(|c| c.name.clone())
        .collect()
}

/// Runs the named checks, prints their results and returns the process
/// exit code (0 iff every result is OK).
///
/// # Errors
///
/// Returns an error if a name is unknown (nothing runs in that case) or if
/// writing the report fails.
pub async fn run_checks(
    dispatcher: &Dispatcher<'_>,
    names: &[String],
    parallel: bool,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    let results = dispatcher.dispatch_all(names, parallel).await?;
    write_results(out, &results, json)?;
    Ok(exit_code(&results))
}
