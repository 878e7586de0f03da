use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use opsguard::application::catalog::build_catalog;
use opsguard::application::config::AppConfig;
use opsguard::application::services::alerter::Alerter;
use opsguard::application::services::dispatcher::Dispatcher;
use opsguard::domain::value_objects::TimeoutPolicy;
use opsguard::infrastructure::collectors::process_collector::ProcessCollector;
use opsguard::infrastructure::notifications::create_notifiers;
use opsguard::presentation::cli::app::{Cli, Commands};
use opsguard::presentation::cli::commands::config::run_config;
use opsguard::presentation::cli::commands::daemon::run_daemon;
use opsguard::presentation::cli::commands::list::run_list;
use opsguard::presentation::cli::commands::menu::run_menu;
use opsguard::presentation::cli::commands::run::{all_read_only, run_checks};

fn print_banner() {
    println!("{}", "━".repeat(40).cyan());
    println!("{}", "  opsguard: operational checks".bold().cyan());
    println!("{}", "━".repeat(40).cyan());
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    // stdout is reserved for reports (and --json)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path()?,
    };

    if let Commands::Config { path, init } = cli.command {
        run_config(&config_path, path, init, &mut io::stdout().lock())?;
        return Ok(0);
    }

    // An explicit --config must exist; the default location is created on first use
    let mut config = if cli.config.is_some() {
        AppConfig::load_from(&config_path)?
    } else {
        AppConfig::load_or_create(&config_path)?
    };
    cli.command.apply_overrides(&mut config);

    // Manual DI: main.rs is the only place that knows concrete types
    let catalog = build_catalog(&config).context("invalid configuration")?;
    let collector = ProcessCollector::new(TimeoutPolicy::from(&config.timeouts));
    let sinks = create_notifiers(&config.notifications).context("invalid notification settings")?;
    let alerter = Alerter::new(sinks);
    tracing::debug!(channels = ?alerter.channels(), checks = catalog.len(), "ready");
    let dispatcher = Dispatcher::new(&catalog, &collector, &alerter);

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Commands::Run { names, all, .. } => {
            let names = if *all {
                all_read_only(&catalog)
            } else {
                names.clone()
            };
            run_checks(&dispatcher, &names, config.general.parallel, cli.json, &mut stdout).await
        }
        Commands::List => {
            run_list(&catalog, cli.json, &mut stdout)?;
            Ok(0)
        }
        Commands::Menu => {
            print_banner();
            run_menu(&dispatcher, &mut io::stdin().lock(), &mut stdout).await?;
            Ok(0)
        }
        Commands::Daemon { names, .. } => {
            let names = if names.is_empty() {
                all_read_only(&catalog)
            } else {
                names.clone()
            };
            print_banner();
            run_daemon(
                &dispatcher,
                &names,
                config.general.interval_secs,
                config.general.parallel,
            )
            .await?;
            Ok(0)
        }
        command => {
            let name = command
                .check_name()
                .context("this command does not run a check")?;
            run_checks(&dispatcher, &[name.to_string()], false, cli.json, &mut stdout).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = u8::from(e.use_stderr());
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    setup_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(1)
        }
    }
}
