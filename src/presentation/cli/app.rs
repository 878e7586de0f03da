use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::application::config::AppConfig;

/// opsguard: operational health checks and remediation
///
/// Runs named checks against disks, services, logs, containers, clusters,
/// certificates and cloud instances, reports the verdict and alerts the
/// configured sinks.
#[derive(Parser, Debug)]
#[command(name = "opsguard")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Delete log files older than the retention period
    CleanupLogs {
        /// List candidates without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Container state and daemon reachability
    CheckDocker,

    /// Dump the database, compress it and prune old backups
    BackupDb,

    /// CPU, memory and disk thresholds
    #[command(alias = "m")]
    Monitor,

    /// Pull, install, build and restart the application
    Deploy,

    /// Count error and warning lines in a log file
    AnalyzeLogs {
        /// Log file to analyze (default: config)
        #[arg(long)]
        file: Option<String>,
    },

    /// Certificate expiry per domain
    CheckSsl {
        /// Domain to check, repeatable (default: config)
        #[arg(long = "domain", value_name = "DOMAIN")]
        domains: Vec<String>,
    },

    /// Node readiness and pod health
    CheckK8s,

    /// Terminate instances stopped for too long
    CleanupAws {
        /// Report candidates only
        #[arg(long, conflicts_with = "execute")]
        dry_run: bool,

        /// Actually terminate the candidates
        #[arg(long)]
        execute: bool,
    },

    /// Tests, lint and build, stopping at the first failure
    CiChecks,

    /// Run registered checks by name
    #[command(alias = "r")]
    Run {
        /// Check names
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        names: Vec<String>,

        /// Run every read-only check (probes and composites)
        #[arg(long)]
        all: bool,

        /// Run the checks concurrently
        #[arg(long)]
        parallel: bool,
    },

    /// List registered checks
    #[command(alias = "ls")]
    List,

    /// Interactive diagnostics menu
    Menu,

    /// Run checks periodically until Ctrl-C
    #[command(alias = "d")]
    Daemon {
        /// Seconds between cycles (default: config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Checks to run each cycle (default: every read-only check)
        names: Vec<String>,
    },

    /// Show or create the configuration file
    #[command(alias = "c")]
    Config {
        /// Print the configuration file path only
        #[arg(long, conflicts_with = "init")]
        path: bool,

        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

impl Commands {
    /// Catalog name for subcommands that run exactly one check.
    #[must_use]
    pub const fn check_name(&self) -> Option<&'static str> {
        match self {
            Self::CleanupLogs { .. } => Some("cleanup-logs"),
            Self::CheckDocker => Some("check-docker"),
            Self::BackupDb => Some("backup-db"),
            Self::Monitor => Some("monitor"),
            Self::Deploy => Some("deploy"),
            Self::AnalyzeLogs { .. } => Some("analyze-logs"),
            Self::CheckSsl { .. } => Some("check-ssl"),
            Self::CheckK8s => Some("check-k8s"),
            Self::CleanupAws { .. } => Some("cleanup-aws"),
            Self::CiChecks => Some("ci-checks"),
            Self::Run { .. }
            | Self::List
            | Self::Menu
            | Self::Daemon { .. }
            | Self::Config { .. } => None,
        }
    }

    /// Folds per-command flags into the loaded configuration so check
    /// definitions are built from a single source.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Self::CleanupLogs { dry_run: true } => config.logs.dry_run = true,
            Self::AnalyzeLogs { file: Some(file) } => config.logs.file.clone_from(file),
            Self::CheckSsl { domains } if !domains.is_empty() => {
                config.ssl.domains.clone_from(domains);
            }
            Self::CleanupAws { dry_run, execute } => {
                if *execute {
                    config.aws.dry_run = false;
                } else if *dry_run {
                    config.aws.dry_run = true;
                }
            }
            Self::Run { parallel: true, .. } => config.general.parallel = true,
            Self::Daemon {
                interval: Some(secs),
                ..
            } => config.general.interval_secs = *secs,
            _ => {}
        }
    }
}
