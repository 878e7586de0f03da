use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::value_objects::{CheckStatus, TimeoutPolicy};

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub ssl: SslConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub ci: CiConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

/// Batch behaviour and daemon cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub parallel: bool,
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

/// Per-class command timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_quick_secs")]
    pub quick_secs: u64,
    #[serde(default = "default_network_secs")]
    pub network_secs: u64,
    #[serde(default = "default_build_secs")]
    pub build_secs: u64,
    #[serde(default = "default_dump_secs")]
    pub dump_secs: u64,
}

/// Notification sinks. A sink is enabled by configuring it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_min_status")]
    pub min_status: CheckStatus,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Check name to sink channels (`log`, `webhook`, `email`). Checks not
    /// listed alert every configured sink.
    #[serde(default)]
    pub routes: BTreeMap<String, Vec<String>>,
}

/// SMTP relay settings. The password is never stored in the file, only the
/// name of the environment variable holding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub to: String,
    #[serde(default = "default_email_from")]
    pub from: String,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
}

/// Resource thresholds for `monitor` and the matching diagnostics (percent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_threshold")]
    pub cpu_threshold: u32,
    #[serde(default = "default_threshold")]
    pub memory_threshold: u32,
    #[serde(default = "default_threshold")]
    pub disk_threshold: u32,
    #[serde(default = "default_critical")]
    pub cpu_critical: u32,
    #[serde(default = "default_critical")]
    pub memory_critical: u32,
    #[serde(default = "default_critical")]
    pub disk_critical: u32,
}

/// Database dump target and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    #[serde(default = "default_db_user")]
    pub db_user: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_backup_retention")]
    pub retention_days: u32,
    #[serde(default = "default_backup_max_age")]
    pub max_age_hours: u32,
}

/// Certificate expiry windows, in days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslConfig {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default = "default_ssl_warn_days")]
    pub warn_days: u32,
    #[serde(default = "default_ssl_critical_days")]
    pub critical_days: u32,
    #[serde(default = "default_ssl_port")]
    pub port: u16,
}

/// Stopped-instance cleanup. Dry-run unless explicitly disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_stopped_age")]
    pub stopped_instance_age_days: u32,
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default)]
    pub region: Option<String>,
}

/// Log retention and error-rate analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_log_retention")]
    pub retention_days: u32,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_error_pattern")]
    pub error_pattern: String,
    #[serde(default = "default_warn_pattern")]
    pub warn_pattern: String,
    #[serde(default = "default_warn_count")]
    pub warn_count: u32,
    #[serde(default = "default_critical_count")]
    pub critical_count: u32,
    #[serde(default)]
    pub dry_run: bool,
}

/// Containers that must be in the `running` state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerConfig {
    #[serde(default)]
    pub containers: Vec<String>,
}

/// Cluster scope. No namespace means all namespaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesConfig {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
}

/// CI gate commands, as argv lists run from `workdir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    #[serde(default = "default_workdir")]
    pub workdir: String,
    #[serde(default = "default_ci_test")]
    pub test: Vec<String>,
    #[serde(default = "default_ci_lint")]
    pub lint: Vec<String>,
    #[serde(default = "default_ci_build")]
    pub build: Vec<String>,
}

/// Git-based deployment target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_app_dir")]
    pub app_dir: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_service")]
    pub service: String,
}

/// Inputs for the host diagnostics offered in the menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    #[serde(default = "default_expected_ports")]
    pub expected_ports: Vec<u16>,
    #[serde(default = "default_ping_host")]
    pub ping_host: String,
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,
    #[serde(default = "default_dns_name")]
    pub dns_name: String,
    #[serde(default = "default_load_factor")]
    pub load_factor: f64,
    #[serde(default = "default_threshold")]
    pub inode_threshold: u32,
}

// --- Defaults ---

const fn default_interval() -> u64 {
    300
}

const fn default_quick_secs() -> u64 {
    10
}

const fn default_network_secs() -> u64 {
    30
}

const fn default_build_secs() -> u64 {
    600
}

const fn default_dump_secs() -> u64 {
    1800
}

const fn default_min_status() -> CheckStatus {
    CheckStatus::Warn
}

fn default_email_from() -> String {
    "opsguard@localhost".into()
}

fn default_smtp_host() -> String {
    "localhost".into()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_threshold() -> u32 {
    80
}

const fn default_critical() -> u32 {
    95
}

// NOTE: Stored as raw string with tilde, expanded with `expand_path` at point of use.
fn default_backup_dir() -> String {
    "~/backups/mysql".into()
}

fn default_db_user() -> String {
    "backup".into()
}

fn default_db_name() -> String {
    "app".into()
}

const fn default_backup_retention() -> u32 {
    7
}

const fn default_backup_max_age() -> u32 {
    26
}

const fn default_ssl_warn_days() -> u32 {
    30
}

const fn default_ssl_critical_days() -> u32 {
    7
}

const fn default_ssl_port() -> u16 {
    443
}

const fn default_stopped_age() -> u32 {
    30
}

const fn default_true() -> bool {
    true
}

fn default_log_dir() -> String {
    "/var/log/app".into()
}

const fn default_log_retention() -> u32 {
    30
}

fn default_log_file() -> String {
    "/var/log/syslog".into()
}

fn default_error_pattern() -> String {
    "error|fatal|critical".into()
}

fn default_warn_pattern() -> String {
    "warn".into()
}

const fn default_warn_count() -> u32 {
    10
}

const fn default_critical_count() -> u32 {
    50
}

const fn default_max_restarts() -> u32 {
    5
}

fn default_workdir() -> String {
    ".".into()
}

fn default_ci_test() -> Vec<String> {
    vec!["npm".into(), "test".into()]
}

fn default_ci_lint() -> Vec<String> {
    vec!["npm".into(), "run".into(), "lint".into()]
}

fn default_ci_build() -> Vec<String> {
    vec!["npm".into(), "run".into(), "build".into()]
}

fn default_app_dir() -> String {
    "/var/www/app".into()
}

fn default_remote() -> String {
    "origin".into()
}

fn default_branch() -> String {
    "main".into()
}

fn default_service() -> String {
    "app".into()
}

fn default_services() -> Vec<String> {
    vec!["ssh".into(), "cron".into()]
}

fn default_expected_ports() -> Vec<u16> {
    vec![22]
}

fn default_ping_host() -> String {
    "1.1.1.1".into()
}

const fn default_ping_count() -> u32 {
    4
}

fn default_dns_name() -> String {
    "example.com".into()
}

const fn default_load_factor() -> f64 {
    2.0
}

// --- Default impls ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            interval_secs: default_interval(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            quick_secs: default_quick_secs(),
            network_secs: default_network_secs(),
            build_secs: default_build_secs(),
            dump_secs: default_dump_secs(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            min_status: default_min_status(),
            log_file: None,
            webhook_url: None,
            email: None,
            routes: BTreeMap::new(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: default_threshold(),
            memory_threshold: default_threshold(),
            disk_threshold: default_threshold(),
            cpu_critical: default_critical(),
            memory_critical: default_critical(),
            disk_critical: default_critical(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            db_user: default_db_user(),
            db_name: default_db_name(),
            retention_days: default_backup_retention(),
            max_age_hours: default_backup_max_age(),
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            warn_days: default_ssl_warn_days(),
            critical_days: default_ssl_critical_days(),
            port: default_ssl_port(),
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            stopped_instance_age_days: default_stopped_age(),
            dry_run: default_true(),
            region: None,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            retention_days: default_log_retention(),
            file: default_log_file(),
            error_pattern: default_error_pattern(),
            warn_pattern: default_warn_pattern(),
            warn_count: default_warn_count(),
            critical_count: default_critical_count(),
            dry_run: false,
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            context: None,
            max_restarts: default_max_restarts(),
        }
    }
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            test: default_ci_test(),
            lint: default_ci_lint(),
            build: default_ci_build(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            app_dir: default_app_dir(),
            remote: default_remote(),
            branch: default_branch(),
            service: default_service(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
            expected_ports: default_expected_ports(),
            ping_host: default_ping_host(),
            ping_count: default_ping_count(),
            dns_name: default_dns_name(),
            load_factor: default_load_factor(),
            inode_threshold: default_threshold(),
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load from a specific path, or create a default config file if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is invalid,
    /// or the default config file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "created default configuration");
            Ok(config)
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save config to a specific path, creating parent directories if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/opsguard/config.toml` (or the platform equivalent).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no config directory.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("opsguard").join("config.toml"))
    }
}

impl MonitorConfig {
    /// `(warn, critical)` for CPU, critical never below warn.
    #[must_use]
    pub fn cpu_limits(&self) -> (f64, f64) {
        limits(self.cpu_threshold, self.cpu_critical)
    }

    #[must_use]
    pub fn memory_limits(&self) -> (f64, f64) {
        limits(self.memory_threshold, self.memory_critical)
    }

    #[must_use]
    pub fn disk_limits(&self) -> (f64, f64) {
        limits(self.disk_threshold, self.disk_critical)
    }
}

fn limits(warn: u32, critical: u32) -> (f64, f64) {
    let warn = f64::from(warn.min(100));
    let critical = f64::from(critical.min(100)).max(warn);
    (warn, critical)
}

impl From<&TimeoutConfig> for TimeoutPolicy {
    fn from(config: &TimeoutConfig) -> Self {
        // A zero timeout would fail every command immediately
        let secs = |s: u64| Duration::from_secs(s.max(1));
        Self {
            quick: secs(config.quick_secs),
            network: secs(config.network_secs),
            build: secs(config.build_secs),
            dump: secs(config.dump_secs),
        }
    }
}

/// Expands a leading `~` in a configured path.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
