use crate::application::config::{expand_path, AppConfig, KubernetesConfig};
use crate::domain::entities::check::{
    CheckDefinition, CheckPlan, Probe, Remediation, Step, Surface,
};
use crate::domain::entities::command::{CommandSpec, SUBJECT_PLACEHOLDER, TIMESTAMP_PLACEHOLDER};
use crate::domain::entities::rule::ThresholdRule;
use crate::domain::extractors::Extractor;
use crate::domain::value_objects::{CommandClass, Comparator};

use super::CatalogError;

pub(super) fn definitions(config: &AppConfig) -> Result<Vec<CheckDefinition>, CatalogError> {
    Ok(vec![
        cleanup_logs(config),
        check_docker(config),
        backup_db(config),
        monitor(config),
        deploy(config),
        analyze_logs(config),
        check_ssl(config)?,
        check_k8s(config),
        cleanup_aws(config),
        ci_checks(config)?,
    ])
}

fn command(name: &str, summary: &str, plan: CheckPlan) -> CheckDefinition {
    CheckDefinition::new(name, summary, Surface::Command, plan)
}

fn cleanup_logs(config: &AppConfig) -> CheckDefinition {
    let logs = &config.logs;
    let dir = expand_path(&logs.log_dir);
    let probe = Probe {
        label: "old log files".into(),
        command: CommandSpec::new(
            "find",
            [
                dir.to_string_lossy().into_owned(),
                "-type".into(),
                "f".into(),
                "-name".into(),
                "*.log".into(),
                "-printf".into(),
                "%T@ %p\\n".into(),
            ],
        ),
        extractor: Extractor::FileTimes,
        rules: vec![ThresholdRule::new(
            "mtime",
            Comparator::AgeExceeds,
            f64::from(logs.retention_days),
        )],
    };
    command(
        "cleanup-logs",
        "delete log files older than retention",
        CheckPlan::Remediate(Remediation {
            probe,
            action: CommandSpec::new("rm", ["-f", SUBJECT_PLACEHOLDER]),
            dry_run: logs.dry_run,
        }),
    )
}

fn check_docker(config: &AppConfig) -> CheckDefinition {
    let required = config.docker.containers.clone();
    let mut state_rule = ThresholdRule::new("state", Comparator::NotEqual, "running");
    if !required.is_empty() {
        state_rule = state_rule.always_critical();
    }
    command(
        "check-docker",
        "container state + daemon reachability",
        CheckPlan::Probe(Probe {
            label: "containers".into(),
            command: CommandSpec::new("docker", ["ps", "-a", "--format", "{{json .}}"])
                .class(CommandClass::Network),
            extractor: Extractor::DockerContainers { required },
            rules: vec![
                state_rule,
                ThresholdRule::new("status", Comparator::Contains, "unhealthy"),
            ],
        }),
    )
}

fn backup_db(config: &AppConfig) -> CheckDefinition {
    let backup = &config.backup;
    let dir = expand_path(&backup.backup_dir).to_string_lossy().into_owned();
    let dump = format!("{dir}/{}_{TIMESTAMP_PLACEHOLDER}.sql", backup.db_name);

    let steps = vec![
        Step::new("prepare", CommandSpec::new("mkdir", ["-p", dir.as_str()])),
        Step::new(
            "dump",
            CommandSpec::new(
                "mysqldump",
                [
                    "--single-transaction".to_string(),
                    format!("--user={}", backup.db_user),
                    format!("--result-file={dump}"),
                    backup.db_name.clone(),
                ],
            )
            .class(CommandClass::Dump),
        )
        .on_failure(CommandSpec::new("rm", ["-f", dump.as_str()])),
        Step::new(
            "compress",
            CommandSpec::new("gzip", [dump.as_str()]).class(CommandClass::Dump),
        ),
        Step::new(
            "prune",
            CommandSpec::new(
                "find",
                [
                    dir.clone(),
                    "-maxdepth".into(),
                    "1".into(),
                    "-name".into(),
                    format!("{}_*.sql.gz", backup.db_name),
                    "-mtime".into(),
                    format!("+{}", backup.retention_days),
                    "-delete".into(),
                ],
            ),
        ),
    ];
    command(
        "backup-db",
        "mysqldump → gzip → prune old backups",
        CheckPlan::Sequence(steps),
    )
}

pub(super) fn cpu_probe(config: &AppConfig) -> Probe {
    let (warn, critical) = config.monitor.cpu_limits();
    Probe {
        label: "cpu".into(),
        command: CommandSpec::new("vmstat", ["1", "2"]),
        extractor: Extractor::CpuUsage,
        rules: vec![ThresholdRule::gt("cpu_used", warn).critical_at(critical).required()],
    }
}

pub(super) fn memory_probe(config: &AppConfig) -> Probe {
    let (warn, critical) = config.monitor.memory_limits();
    Probe {
        label: "memory".into(),
        command: CommandSpec::new("cat", ["/proc/meminfo"]),
        extractor: Extractor::MemInfo,
        rules: vec![ThresholdRule::gt("memory_used", warn)
            .critical_at(critical)
            .required()],
    }
}

pub(super) fn disk_probe(config: &AppConfig) -> Probe {
    let (warn, critical) = config.monitor.disk_limits();
    Probe {
        label: "disk".into(),
        command: CommandSpec::new("df", ["-P"]),
        extractor: Extractor::DiskUsage,
        rules: vec![ThresholdRule::gt("disk_used", warn)
            .critical_at(critical)
            .required()],
    }
}

fn monitor(config: &AppConfig) -> CheckDefinition {
    command(
        "monitor",
        "cpu/memory/disk thresholds",
        CheckPlan::Composite(vec![
            cpu_probe(config),
            memory_probe(config),
            disk_probe(config),
        ]),
    )
}

fn deploy(config: &AppConfig) -> CheckDefinition {
    let deploy = &config.deploy;
    let dir = expand_path(&deploy.app_dir);
    let build = |program: &str, args: &[&str]| {
        CommandSpec::new(program, args.iter().copied())
            .class(CommandClass::Build)
            .in_dir(&dir)
    };
    let steps = vec![
        Step::new(
            "pull",
            build(
                "git",
                &["pull", "--ff-only", deploy.remote.as_str(), deploy.branch.as_str()],
            ),
        ),
        Step::new("install", build("npm", &["ci"])),
        Step::new("build", build("npm", &["run", "build"])),
        // systemctl blocks until the unit is up, bounded by its own start timeout
        Step::new(
            "restart",
            CommandSpec::new("systemctl", ["restart", deploy.service.as_str()])
                .class(CommandClass::Build),
        ),
    ];
    command(
        "deploy",
        "git pull → npm ci → build → restart",
        CheckPlan::Sequence(steps),
    )
}

fn analyze_logs(config: &AppConfig) -> CheckDefinition {
    let logs = &config.logs;
    let file = expand_path(&logs.file).to_string_lossy().into_owned();
    command(
        "analyze-logs",
        "count error/warn patterns in a log",
        CheckPlan::Probe(Probe {
            label: "log levels".into(),
            command: CommandSpec::new("cat", [file.as_str()]),
            extractor: Extractor::LogLevels {
                subject: file.clone(),
                error_pattern: logs.error_pattern.clone(),
                warn_pattern: logs.warn_pattern.clone(),
            },
            rules: vec![ThresholdRule::gt("errors", f64::from(logs.warn_count))
                .critical_at(f64::from(logs.critical_count))],
        }),
    )
}

/// Hostnames end up inside an `sh -c` pipeline; only the DNS charset passes.
fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && !domain.starts_with('-')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

fn check_ssl(config: &AppConfig) -> Result<CheckDefinition, CatalogError> {
    let ssl = &config.ssl;
    let probes = ssl
        .domains
        .iter()
        .map(|domain| {
            if !is_valid_domain(domain) {
                return Err(CatalogError::InvalidDomain(domain.clone()));
            }
            let pipeline = format!(
                "echo | openssl s_client -servername {domain} -connect {domain}:{port} 2>/dev/null \
                 | openssl x509 -noout -enddate",
                port = ssl.port
            );
            Ok(Probe {
                label: domain.clone(),
                command: CommandSpec::new("sh", ["-c".to_string(), pipeline])
                    .class(CommandClass::Network),
                extractor: Extractor::CertExpiry {
                    domain: domain.clone(),
                },
                rules: vec![ThresholdRule::lt("days_left", f64::from(ssl.warn_days))
                    .critical_at(f64::from(ssl.critical_days))
                    .required()],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(command(
        "check-ssl",
        "certificate expiry per domain",
        CheckPlan::Composite(probes),
    ))
}

/// `kubectl get <resource> -o json` scoped by context and namespace.
pub(super) fn kubectl_get(k8s: &KubernetesConfig, resource: &str, namespaced: bool) -> CommandSpec {
    let mut args = Vec::new();
    if let Some(context) = &k8s.context {
        args.push(format!("--context={context}"));
    }
    args.extend(["get".to_string(), resource.to_string()]);
    if namespaced {
        match &k8s.namespace {
            Some(ns) => args.push(format!("--namespace={ns}")),
            None => args.push("--all-namespaces".into()),
        }
    }
    args.extend(["-o".to_string(), "json".to_string()]);
    CommandSpec::new("kubectl", args).class(CommandClass::Network)
}

fn check_k8s(config: &AppConfig) -> CheckDefinition {
    let k8s = &config.kubernetes;
    command(
        "check-k8s",
        "node readiness + pod phases",
        CheckPlan::Composite(vec![
            Probe {
                label: "nodes".into(),
                command: kubectl_get(k8s, "nodes", false),
                extractor: Extractor::KubeNodes,
                rules: vec![ThresholdRule::new("ready", Comparator::NotEqual, "True")
                    .always_critical()
                    .required()],
            },
            Probe {
                label: "pods".into(),
                command: kubectl_get(k8s, "pods", true),
                extractor: Extractor::KubePods,
                rules: vec![ThresholdRule::new("pod_health", Comparator::NotEqual, "ok")],
            },
        ]),
    )
}

fn cleanup_aws(config: &AppConfig) -> CheckDefinition {
    let aws = &config.aws;
    let region_args: Vec<String> = aws
        .region
        .iter()
        .flat_map(|r| ["--region".to_string(), r.clone()])
        .collect();

    let mut describe = vec![
        "ec2".to_string(),
        "describe-instances".into(),
        "--filters".into(),
        "Name=instance-state-name,Values=stopped".into(),
        "--output".into(),
        "json".into(),
    ];
    describe.extend(region_args.iter().cloned());

    let mut terminate = vec![
        "ec2".to_string(),
        "terminate-instances".into(),
        "--instance-ids".into(),
        SUBJECT_PLACEHOLDER.into(),
    ];
    terminate.extend(region_args);

    command(
        "cleanup-aws",
        "terminate long-stopped instances",
        CheckPlan::Remediate(Remediation {
            probe: Probe {
                label: "stopped instances".into(),
                command: CommandSpec::new("aws", describe).class(CommandClass::Network),
                extractor: Extractor::StoppedInstances,
                rules: vec![ThresholdRule::new(
                    "stopped_since",
                    Comparator::AgeExceeds,
                    f64::from(aws.stopped_instance_age_days),
                )],
            },
            action: CommandSpec::new("aws", terminate).class(CommandClass::Network),
            dry_run: aws.dry_run,
        }),
    )
}

fn ci_checks(config: &AppConfig) -> Result<CheckDefinition, CatalogError> {
    let ci = &config.ci;
    let workdir = expand_path(&ci.workdir);
    let steps = [("test", &ci.test), ("lint", &ci.lint), ("build", &ci.build)]
        .into_iter()
        .map(|(label, argv)| {
            let command = CommandSpec::from_argv(argv).ok_or_else(|| {
                CatalogError::InvalidCommand {
                    check: "ci-checks".into(),
                    reason: format!("the {label} command is empty"),
                }
            })?;
            Ok(Step::new(
                label,
                command.class(CommandClass::Build).in_dir(&workdir),
            ))
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    Ok(command(
        "ci-checks",
        "npm test → lint → build, stop at first failure",
        CheckPlan::Sequence(steps),
    ))
}
