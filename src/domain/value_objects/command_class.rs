use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of external command, used to derive a default timeout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommandClass {
    /// Local introspection: df, ps, systemctl, /proc reads
    #[default]
    Quick,
    /// Anything that talks to a daemon or a remote endpoint
    Network,
    /// Package manager, VCS and build tooling
    Build,
    /// Database dumps and compression
    Dump,
}

impl CommandClass {
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        match self {
            Self::Quick => Duration::from_secs(10),
            Self::Network => Duration::from_secs(30),
            Self::Build => Duration::from_secs(600),
            Self::Dump => Duration::from_secs(1800),
        }
    }
}

/// Per-class timeouts, overridable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub quick: Duration,
    pub network: Duration,
    pub build: Duration,
    pub dump: Duration,
}

impl TimeoutPolicy {
    #[must_use]
    pub const fn for_class(&self, class: CommandClass) -> Duration {
        match class {
            CommandClass::Quick => self.quick,
            CommandClass::Network => self.network,
            CommandClass::Build => self.build,
            CommandClass::Dump => self.dump,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            quick: CommandClass::Quick.default_timeout(),
            network: CommandClass::Network.default_timeout(),
            build: CommandClass::Build.default_timeout(),
            dump: CommandClass::Dump.default_timeout(),
        }
    }
}
