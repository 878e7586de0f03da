use std::thread;

use crate::application::config::{expand_path, AppConfig};
use crate::domain::entities::check::{CheckDefinition, CheckPlan, Probe, Surface};
use crate::domain::entities::command::CommandSpec;
use crate::domain::entities::rule::ThresholdRule;
use crate::domain::extractors::Extractor;
use crate::domain::value_objects::{CommandClass, Comparator};

use super::commands::{cpu_probe, disk_probe, kubectl_get, memory_probe};

pub(super) fn definitions(config: &AppConfig) -> Vec<CheckDefinition> {
    vec![
        diagnostic("cpu-usage", "CPU busy percentage", cpu_probe(config)),
        diagnostic("memory-usage", "memory in use", memory_probe(config)),
        diagnostic("disk-usage", "space used per mount point", disk_probe(config)),
        diagnostic("inode-usage", "inodes used per mount point", inode_probe(config)),
        diagnostic("load-average", "1-minute load vs CPU count", load_probe(config)),
        diagnostic("zombie-processes", "processes in Z state", zombie_probe()),
        diagnostic("failed-units", "systemd units in failed state", failed_units_probe()),
        CheckDefinition::new(
            "service-status",
            "configured services are active",
            Surface::Diagnostic,
            CheckPlan::Composite(
                config
                    .system
                    .services
                    .iter()
                    .map(String::as_str)
                    .map(service_probe)
                    .collect(),
            ),
        ),
        diagnostic("listening-ports", "expected TCP ports are listening", ports_probe(config)),
        diagnostic("network-ping", "packet loss to the reference host", ping_probe(config)),
        diagnostic("dns-resolution", "reference name resolves", dns_probe(config)),
        diagnostic("docker-disk", "reclaimable Docker disk space", docker_disk_probe()),
        diagnostic("k8s-restarts", "pod container restarts", restarts_probe(config)),
        diagnostic("backup-freshness", "age of the newest backup", backup_probe(config)),
        diagnostic("npm-audit", "dependency vulnerabilities", audit_probe(config)),
    ]
}

fn diagnostic(name: &str, summary: &str, probe: Probe) -> CheckDefinition {
    CheckDefinition::new(name, summary, Surface::Diagnostic, CheckPlan::Probe(probe))
}

fn inode_probe(config: &AppConfig) -> Probe {
    let warn = f64::from(config.system.inode_threshold.min(100));
    Probe {
        label: "inodes".into(),
        command: CommandSpec::new("df", ["-Pi"]),
        extractor: Extractor::InodeUsage,
        rules: vec![ThresholdRule::gt("inode_used", warn)
            .critical_at(warn.max(95.0))
            .required()],
    }
}

/// Warn when the 1-minute load exceeds `load_factor` × CPUs, critical at twice that.
fn load_probe(config: &AppConfig) -> Probe {
    let cpus = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    #[allow(clippy::cast_precision_loss)]
    let limit = config.system.load_factor.max(0.1) * cpus as f64;
    Probe {
        label: "load".into(),
        command: CommandSpec::new("cat", ["/proc/loadavg"]),
        extractor: Extractor::LoadAverage,
        rules: vec![ThresholdRule::gt("load_1m", limit)
            .critical_at(limit * 2.0)
            .required()],
    }
}

fn zombie_probe() -> Probe {
    Probe {
        label: "zombies".into(),
        command: CommandSpec::new("ps", ["-eo", "stat=,pid=,comm="]),
        extractor: Extractor::ZombieProcesses,
        rules: vec![ThresholdRule::gt("zombies", 0.0)],
    }
}

fn failed_units_probe() -> Probe {
    Probe {
        label: "failed units".into(),
        command: CommandSpec::new(
            "systemctl",
            ["list-units", "--state=failed", "--no-legend", "--plain"],
        ),
        extractor: Extractor::LineCount {
            metric: "failed_units".into(),
            subject: "systemd".into(),
        },
        rules: vec![ThresholdRule::gt("failed_units", 0.0)],
    }
}

/// `systemctl is-active` exits 3 for inactive units; the state text decides.
fn service_probe(service: &str) -> Probe {
    Probe {
        label: service.to_string(),
        command: CommandSpec::new("systemctl", ["is-active", service])
            .accept_exit_codes(&[0, 3, 4]),
        extractor: Extractor::Trimmed {
            metric: "active_state".into(),
            subject: service.to_string(),
        },
        rules: vec![ThresholdRule::new("active_state", Comparator::NotEqual, "active")
            .always_critical()
            .required()],
    }
}

fn ports_probe(config: &AppConfig) -> Probe {
    Probe {
        label: "ports".into(),
        command: CommandSpec::new("ss", ["-Htln"]),
        extractor: Extractor::ListeningPorts {
            expected: config.system.expected_ports.clone(),
        },
        rules: vec![
            ThresholdRule::new("port", Comparator::NotEqual, "listening").always_critical(),
        ],
    }
}

/// `ping` exits 1 when no reply arrives; the loss figure still gets parsed.
fn ping_probe(config: &AppConfig) -> Probe {
    let host = config.system.ping_host.clone();
    Probe {
        label: "ping".into(),
        command: CommandSpec::new(
            "ping",
            [
                "-c".to_string(),
                config.system.ping_count.max(1).to_string(),
                host.clone(),
            ],
        )
        .class(CommandClass::Network)
        .accept_exit_codes(&[0, 1]),
        extractor: Extractor::PacketLoss { host },
        rules: vec![ThresholdRule::gt("packet_loss", 0.0).critical_at(50.0).required()],
    }
}

fn dns_probe(config: &AppConfig) -> Probe {
    let name = config.system.dns_name.clone();
    Probe {
        label: "dns".into(),
        command: CommandSpec::new("dig", ["+short".to_string(), name.clone()])
            .class(CommandClass::Network),
        extractor: Extractor::LineCount {
            metric: "answers".into(),
            subject: name,
        },
        rules: vec![ThresholdRule::lt("answers", 1.0).always_critical()],
    }
}

fn docker_disk_probe() -> Probe {
    Probe {
        label: "docker disk".into(),
        command: CommandSpec::new("docker", ["system", "df", "--format", "{{json .}}"])
            .class(CommandClass::Network),
        extractor: Extractor::DockerDiskUsage,
        rules: vec![ThresholdRule::gt("reclaimable", 50.0).critical_at(80.0)],
    }
}

fn restarts_probe(config: &AppConfig) -> Probe {
    let max = f64::from(config.kubernetes.max_restarts);
    Probe {
        label: "restarts".into(),
        command: kubectl_get(&config.kubernetes, "pods", true),
        extractor: Extractor::KubeRestarts,
        rules: vec![ThresholdRule::gt("restarts", max).critical_at(max * 4.0)],
    }
}

fn backup_probe(config: &AppConfig) -> Probe {
    let backup = &config.backup;
    let dir = expand_path(&backup.backup_dir).to_string_lossy().into_owned();
    let max_age_days = f64::from(backup.max_age_hours) / 24.0;
    Probe {
        label: "backups".into(),
        command: CommandSpec::new(
            "find",
            [
                dir,
                "-maxdepth".into(),
                "1".into(),
                "-name".into(),
                format!("{}_*.sql.gz", backup.db_name),
                "-printf".into(),
                "%T@ %p\\n".into(),
            ],
        ),
        extractor: Extractor::NewestFile,
        rules: vec![ThresholdRule::new("mtime", Comparator::AgeExceeds, max_age_days)
            .critical_at(max_age_days * 2.0)
            .required()],
    }
}

/// `npm audit` exits 1 whenever vulnerabilities are found.
fn audit_probe(config: &AppConfig) -> Probe {
    Probe {
        label: "audit".into(),
        command: CommandSpec::new("npm", ["audit", "--json"])
            .class(CommandClass::Build)
            .in_dir(expand_path(&config.ci.workdir))
            .accept_exit_codes(&[0, 1]),
        extractor: Extractor::NpmAudit,
        rules: vec![
            ThresholdRule::gt("critical", 0.0).always_critical(),
            ThresholdRule::gt("high", 0.0),
        ],
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::rule::Limit;

    fn probe<'a>(defs: &'a [CheckDefinition], name: &str) -> &'a Probe {
        match &defs
            .iter()
            .find(|d| d.name == name)
            .expect("diagnostic registered")
            .plan
        {
            CheckPlan::Probe(probe) => probe,
            other => panic!("{name} should be a single probe, got {other:?}"),
        }
    }

    #[test]
    fn every_diagnostic_is_on_the_menu_surface() {
        let defs = definitions(&AppConfig::default());
        assert_eq!(defs.len(), 15);
        assert!(defs.iter().all(|d| d.surface == Surface::Diagnostic));
    }

    #[test]
    fn service_status_probes_each_service() {
        let mut config = AppConfig::default();
        config.system.services = vec!["nginx".into(), "postgresql".into()];
        let defs = definitions(&config);
        let service = defs
            .iter()
            .find(|d| d.name == "service-status")
            .expect("registered");
        let CheckPlan::Composite(probes) = &service.plan else {
            panic!("service-status should be composite");
        };
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[1].command.to_string(), "systemctl is-active postgresql");
        assert!(probes[0].command.accepts(3));
    }

    #[test]
    fn backup_freshness_limit_is_in_days() {
        let mut config = AppConfig::default();
        config.backup.max_age_hours = 36;
        let defs = definitions(&config);
        let rule = &probe(&defs, "backup-freshness").rules[0];
        assert_eq!(rule.warn, Limit::Number(1.5));
        assert!(rule.require_samples);
    }

    #[test]
    fn ping_tolerates_total_loss_exit_code() {
        let defs = definitions(&AppConfig::default());
        let ping = probe(&defs, "network-ping");
        assert!(ping.command.accepts(1));
        assert!(!ping.command.accepts(2));
        assert_eq!(ping.command.class, CommandClass::Network);
    }

    #[test]
    fn load_limit_scales_with_factor() {
        let mut config = AppConfig::default();
        config.system.load_factor = 1.0;
        let low = probe(&definitions(&config), "load-average").rules[0].warn.clone();
        config.system.load_factor = 2.0;
        let high = probe(&definitions(&config), "load-average").rules[0].warn.clone();
        match (low, high) {
            (Limit::Number(l), Limit::Number(h)) => assert!((h - 2.0 * l).abs() < 1e-9),
            other => panic!("numeric limits expected, got {other:?}"),
        }
    }
}
