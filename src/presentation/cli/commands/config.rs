use std::io::Write;
use std::path::Path;

use crate::application::config::AppConfig;

/// `config`: prints the path (`--path`), creates a default file (`--init`),
/// or prints the effective configuration as TOML.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or written.
pub fn run_config(path: &Path, show_path: bool, init: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if show_path {
        writeln!(out, "{}", path.display())?;
        return Ok(());
    }

    if init {
        if path.exists() {
            writeln!(out, "configuration already exists: {}", path.display())?;
        } else {
            AppConfig::default().save_to(path)?;
            writeln!(out, "created {}", path.display())?;
        }
        return Ok(());
    }

    let config = if path.exists() {
        AppConfig::load_from(path)?
    } else {
        AppConfig::default()
    };
    write!(out, "{}", toml::to_string_pretty(&config)?)?;
    Ok(())
}
