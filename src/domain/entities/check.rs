use serde::Serialize;

use crate::domain::entities::command::CommandSpec;
use crate::domain::entities::rule::ThresholdRule;
use crate::domain::extractors::Extractor;

/// Where a check is offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// Top-level CLI subcommand
    Command,
    /// Diagnostic listed in the interactive menu
    Diagnostic,
}

/// One command, its output schema, and the rules judging it.
#[derive(Debug, Clone, Serialize)]
pub struct Probe {
    pub label: String,
    pub command: CommandSpec,
    pub extractor: Extractor,
    pub rules: Vec<ThresholdRule>,
}

/// One step of a gated sequence; must exit successfully for the next to run.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub label: String,
    pub command: CommandSpec,
    /// Run once if this step fails, to remove what it left half done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<CommandSpec>,
}

impl Step {
    #[must_use]
    pub fn new(label: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            label: label.into(),
            command,
            on_failure: None,
        }
    }

    #[must_use]
    pub fn on_failure(mut self, cleanup: CommandSpec) -> Self {
        self.on_failure = Some(cleanup);
        self
    }
}

/// Probe selecting candidates, then an action run once per breaching subject.
#[derive(Debug, Clone, Serialize)]
pub struct Remediation {
    pub probe: Probe,
    /// Rendered with `{subject}` replaced by each candidate
    pub action: CommandSpec,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "spec", rename_all = "lowercase")]
pub enum CheckPlan {
    Probe(Probe),
    /// Several probes, worst status wins
    Composite(Vec<Probe>),
    /// Ordered steps; first failure skips the rest
    Sequence(Vec<Step>),
    Remediate(Remediation),
}

impl CheckPlan {
    /// True when running the plan only observes: no steps, no remediation.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::Probe(_) | Self::Composite(_))
    }
}

/// Immutable description of a named check, built once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct CheckDefinition {
    pub name: String,
    pub summary: String,
    pub surface: Surface,
    pub plan: CheckPlan,
    /// Notifier sinks to alert; empty means every configured sink
    pub targets: Vec<String>,
}

impl CheckDefinition {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        surface: Surface,
        plan: CheckPlan,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            surface,
            plan,
            targets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn step(label: &str) -> Step {
        Step::new(label, CommandSpec::new("true", Vec::<String>::new()))
    }

    #[test]
    fn only_observing_plans_are_read_only() {
        assert!(CheckPlan::Composite(Vec::new()).is_read_only());
        assert!(!CheckPlan::Sequence(vec![step("build")]).is_read_only());
    }

    #[test]
    fn definition_serializes_with_plan_type() {
        let definition = CheckDefinition::new(
            "ci-checks",
            "tests, lint, build",
            Surface::Command,
            CheckPlan::Sequence(vec![step("test"), step("lint")]),
        )
        .with_targets(vec!["email".to_string()]);
        let json = serde_json::to_value(&definition).expect("serialize");
        assert_eq!(json["surface"], "command");
        assert_eq!(json["plan"]["type"], "sequence");
        assert_eq!(json["plan"]["spec"][1]["label"], "lint");
        assert_eq!(json["targets"][0], "email");
    }
}
