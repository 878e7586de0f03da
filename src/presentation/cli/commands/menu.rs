use std::io::{BufRead, Write};

use colored::Colorize;

use crate::application::services::dispatcher::Dispatcher;
use crate::domain::entities::check::Surface;
use crate::presentation::cli::formatters::result_fmt::{write_result, write_section_header};

const QUIT_WORDS: [&str; 4] = ["q", "quit", "exit", "0"];

/// Interactive diagnostics menu.
///
/// Lists the diagnostics by number and runs the one selected, by number
/// or by name (any registered check name is accepted). Loops until a quit
/// word or end of input. A failing check is reported and the menu goes on.
///
/// # Errors
///
/// Returns an error only if reading `input` or writing `output` fails.
pub async fn run_menu(
    dispatcher: &Dispatcher<'_>,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<()> {
    let entries: Vec<&str> = dispatcher
        .catalog()
        .by_surface(Surface::Diagnostic)
        .map(|c| c.name.as_str())
        .collect();

    print_menu(dispatcher, &entries, output)?;
    let mut line = String::new();
    loop {
        write!(output, "{} ", "Select a check (number or name, q to quit):".bold())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let choice = line.trim();
        if choice.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&choice.to_ascii_lowercase().as_str()) {
            break;
        }
        if choice == "?" || choice == "l" {
            print_menu(dispatcher, &entries, output)?;
            continue;
        }

        let Some(name) = resolve(choice, &entries, dispatcher) else {
            writeln!(output, "{} {choice}", "Invalid choice:".red())?;
            continue;
        };
        match dispatcher.dispatch(name).await {
            Ok(result) => write_result(output, &result)?,
            Err(e) => writeln!(output, "{} {e}", "error:".red().bold())?,
        }
    }
    Ok(())
}

fn resolve<'a>(choice: &'a str, entries: &[&'a str], dispatcher: &Dispatcher<'_>) -> Option<&'a str> {
    if let Ok(index) = choice.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| entries.get(i)).copied();
    }
    dispatcher.catalog().contains(choice).then_some(choice)
}

fn print_menu(
    dispatcher: &Dispatcher<'_>,
    entries: &[&str],
    output: &mut impl Write,
) -> std::io::Result<()> {
    write_section_header(output, "opsguard diagnostics")?;
    for (i, name) in entries.iter().enumerate() {
        let summary = dispatcher
            .catalog()
            .get(name)
            .map_or("", |c| c.summary.as_str());
        writeln!(output, "  {:>2}) {name:<18} {}", i + 1, summary.dimmed())?;
    }
    writeln!(output, "   0) quit    ?) show this list")
}
