use crate::domain::entities::sample::{Sample, Value};
use crate::domain::evaluator::EvaluationError;

use super::malformed;

const PSEUDO_FILESYSTEMS: &[&str] = &[
    "tmpfs", "devtmpfs", "udev", "overlay", "squashfs", "none", "shm", "efivarfs", "proc",
    "sysfs",
];

const PSEUDO_MOUNT_ROOTS: &[&str] = &["/snap", "/dev", "/sys", "/proc", "/run"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfMode {
    Blocks,
    Inodes,
}

impl DfMode {
    const fn metric(self) -> &'static str {
        match self {
            Self::Blocks => "disk_used",
            Self::Inodes => "inode_used",
        }
    }

    const fn header(self) -> &'static str {
        match self {
            Self::Blocks => "Capacity",
            Self::Inodes => "IUse%",
        }
    }
}

/// Parses POSIX `df -P` / `df -Pi` output, one sample per real mount point.
pub fn parse_df(stdout: &str, mode: DfMode) -> Result<Vec<Sample>, EvaluationError> {
    let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| malformed("df", "empty output"))?;
    if !header.starts_with("Filesystem") || !header.contains(mode.header()) {
        return Err(malformed(
            "df",
            format!("unexpected header '{}'", header.trim()),
        ));
    }

    let mut samples = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            samples.push(
                Sample::new(mode.metric(), line.trim(), Value::Missing).with_unit("%"),
            );
            continue;
        }
        let filesystem = fields[0];
        let mount = fields[5..].join(" ");
        if is_pseudo(filesystem, &mount) {
            continue;
        }
        // Inode counts are not tracked on some filesystems (btrfs, vfat)
        if fields[4] == "-" {
            continue;
        }
        samples.push(
            Sample::new(mode.metric(), mount, Value::parse_number(fields[4])).with_unit("%"),
        );
    }
    Ok(samples)
}

fn is_pseudo(filesystem: &str, mount: &str) -> bool {
    PSEUDO_FILESYSTEMS.contains(&filesystem)
        || PSEUDO_MOUNT_ROOTS.iter().any(|root| {
            mount == *root
                || mount
                    .strip_prefix(root)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
}
