use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::application::catalog::Catalog;
use crate::domain::entities::check::Surface;
use crate::presentation::cli::formatters::result_fmt::write_section_header;

#[derive(Serialize)]
struct ListedCheck<'a> {
    name: &'a str,
    surface: Surface,
    summary: &'a str,
}

/// Prints every registered check, CLI commands first, then menu diagnostics.
///
/// # Errors
///
/// Returns an error if writing to `out` or JSON serialization fails.
pub fn run_list(catalog: &Catalog, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        let checks: Vec<ListedCheck<'_>> = catalog
            .iter()
            .map(|c| ListedCheck {
                name: &c.name,
                surface: c.surface,
                summary: &c.summary,
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &checks)?;
        writeln!(out)?;
        return Ok(());
    }

    let width = catalog.names().map(str::len).max().unwrap_or(0);
    for (title, surface) in [("Commands", Surface::Command), ("Diagnostics", Surface::Diagnostic)] {
        write_section_header(out, title)?;
        for check in catalog.by_surface(surface) {
            writeln!(out, "  {:<width$}  {}", check.name.bold(), check.summary.dimmed())?;
        }
        writeln!(out)?;
    }
    Ok(())
}
