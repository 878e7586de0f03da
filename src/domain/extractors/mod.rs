//! Parsers turning raw tool output into typed samples.
//!
//! Each extractor validates the schema of the tool it reads. A broken schema
//! (missing header, invalid JSON) fails the whole probe with
//! [`EvaluationError::Malformed`]; a single unreadable field becomes
//! [`Value::Missing`](crate::domain::entities::sample::Value::Missing) so it
//! is reported as `ERROR` for that subject only.

pub mod aws;
pub mod disk;
pub mod docker;
pub mod files;
pub mod kubernetes;
pub mod logs;
pub mod network;
pub mod npm;
pub mod system;
pub mod text;
pub mod tls;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::command::ProbeOutput;
use crate::domain::entities::sample::Sample;
use crate::domain::evaluator::EvaluationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "schema", rename_all = "kebab-case")]
pub enum Extractor {
    /// `df -P`
    DiskUsage,
    /// `df -Pi`
    InodeUsage,
    /// `/proc/meminfo`
    MemInfo,
    /// `vmstat 1 2`
    CpuUsage,
    /// `/proc/loadavg`
    LoadAverage,
    /// `ps -eo stat=,pid=,comm=`
    ZombieProcesses,
    /// Count of non-empty lines
    LineCount { metric: String, subject: String },
    /// Whole stdout as one text value
    Trimmed { metric: String, subject: String },
    /// `docker ps -a --format '{{json .}}'`
    DockerContainers { required: Vec<String> },
    /// `docker system df --format '{{json .}}'`
    DockerDiskUsage,
    /// `kubectl get nodes -o json`
    KubeNodes,
    /// `kubectl get pods -o json`
    KubePods,
    /// `kubectl get pods -o json`, restart counts
    KubeRestarts,
    /// `openssl x509 -noout -enddate`
    CertExpiry { domain: String },
    /// `aws ec2 describe-instances --output json`
    StoppedInstances,
    /// `find -printf '%T@ %p\n'`, one sample per file
    FileTimes,
    /// `find -printf '%T@ %p\n'`, newest file only
    NewestFile,
    /// Log lines matching error/warning patterns
    LogLevels {
        subject: String,
        error_pattern: String,
        warn_pattern: String,
    },
    /// `ping -c N host`
    PacketLoss { host: String },
    /// `ss -Htln`
    ListeningPorts { expected: Vec<u16> },
    /// `npm audit --json`
    NpmAudit,
}

impl Extractor {
    /// Parses `output` according to this extractor's schema.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::Malformed` when the output does not match
    /// the expected schema at all.
    pub fn extract(
        &self,
        output: &ProbeOutput,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sample>, EvaluationError> {
        let stdout = output.stdout.as_str();
        match self {
            Self::DiskUsage => disk::parse_df(stdout, disk::DfMode::Blocks),
            Self::InodeUsage => disk::parse_df(stdout, disk::DfMode::Inodes),
            Self::MemInfo => system::parse_meminfo(stdout),
            Self::CpuUsage => system::parse_vmstat(stdout),
            Self::LoadAverage => system::parse_loadavg(stdout),
            Self::ZombieProcesses => Ok(system::parse_zombies(stdout)),
            Self::LineCount { metric, subject } => Ok(text::line_count(stdout, metric, subject)),
            Self::Trimmed { metric, subject } => Ok(text::trimmed(stdout, metric, subject)),
            Self::DockerContainers { required } => docker::parse_containers(stdout, required),
            Self::DockerDiskUsage => docker::parse_system_df(stdout),
            Self::KubeNodes => kubernetes::parse_nodes(stdout),
            Self::KubePods => kubernetes::parse_pod_health(stdout),
            Self::KubeRestarts => kubernetes::parse_restarts(stdout),
            Self::CertExpiry { domain } => tls::parse_enddate(stdout, domain, now),
            Self::StoppedInstances => aws::parse_stopped_instances(stdout),
            Self::FileTimes => Ok(files::parse_file_times(stdout)),
            Self::NewestFile => Ok(files::newest(files::parse_file_times(stdout))),
            Self::LogLevels {
                subject,
                error_pattern,
                warn_pattern,
            } => Ok(logs::count_levels(stdout, subject, error_pattern, warn_pattern)),
            Self::PacketLoss { host } => network::parse_packet_loss(stdout, host),
            Self::ListeningPorts { expected } => Ok(network::parse_listening(stdout, expected)),
            Self::NpmAudit => npm::parse_audit(stdout),
        }
    }
}

/// Shorthand for a schema violation.
pub(crate) fn malformed(tool: &str, reason: impl Into<String>) -> EvaluationError {
    EvaluationError::Malformed {
        metric: tool.to_string(),
        reason: reason.into(),
    }
}
