//! Registry of named checks, built once from the loaded configuration.

mod commands;
mod diagnostics;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::application::config::AppConfig;
use crate::domain::entities::check::{CheckDefinition, Surface};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid domain name '{0}'")]
    InvalidDomain(String),
    #[error("{check}: {reason}")]
    InvalidCommand { check: String, reason: String },
}

/// Immutable name → definition map. Iteration is in name order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    checks: BTreeMap<String, CheckDefinition>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition, replacing any previous one with the same name.
    pub fn insert(&mut self, definition: CheckDefinition) {
        self.checks.insert(definition.name.clone(), definition);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CheckDefinition> {
        self.checks.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.values()
    }

    pub fn by_surface(&self, surface: Surface) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.values().filter(move |c| c.surface == surface)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl FromIterator<CheckDefinition> for Catalog {
    fn from_iter<T: IntoIterator<Item = CheckDefinition>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

/// Builds every CLI command and menu diagnostic from `config`.
///
/// # Errors
///
/// Returns `CatalogError` when a configured value cannot be turned into a
/// safe command (a domain with shell metacharacters, an empty CI argv).
pub fn build_catalog(config: &AppConfig) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();
    for definition in commands::definitions(config)? {
        catalog.insert(definition);
    }
    for definition in diagnostics::definitions(config) {
        catalog.insert(definition);
    }
    for (name, channels) in &config.notifications.routes {
        match catalog.checks.get_mut(name) {
            Some(definition) => definition.targets.clone_from(channels),
            None => tracing::warn!(check = %name, "notification route for unknown check ignored"),
        }
    }
    tracing::debug!(checks = catalog.len(), "catalog built");
    Ok(catalog)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::check::CheckPlan;

    const COMMANDS: [&str; 10] = [
        "analyze-logs",
        "backup-db",
        "check-docker",
        "check-k8s",
        "check-ssl",
        "ci-checks",
        "cleanup-aws",
        "cleanup-logs",
        "deploy",
        "monitor",
    ];

    #[test]
    fn default_catalog_registers_all_checks() {
        let catalog = build_catalog(&AppConfig::default()).expect("catalog");
        let commands: Vec<&str> = catalog
            .by_surface(Surface::Command)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(commands, COMMANDS);
        assert_eq!(catalog.by_surface(Surface::Diagnostic).count(), 15);
        assert_eq!(catalog.len(), 25);
    }

    #[test]
    fn names_are_sorted() {
        let catalog = build_catalog(&AppConfig::default()).expect("catalog");
        let names: Vec<&str> = catalog.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn unknown_name_is_absent() {
        let catalog = build_catalog(&AppConfig::default()).expect("catalog");
        assert!(catalog.get("format-disk").is_none());
        assert!(catalog.contains("monitor"));
    }

    #[test]
    fn insert_replaces_existing_definition() {
        let mut catalog = Catalog::new();
        catalog.insert(CheckDefinition::new(
            "x",
            "first",
            Surface::Diagnostic,
            CheckPlan::Sequence(Vec::new()),
        ));
        catalog.insert(CheckDefinition::new(
            "x",
            "second",
            Surface::Diagnostic,
            CheckPlan::Sequence(Vec::new()),
        ));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("x").map(|c| c.summary.as_str()), Some("second"));
    }

    #[test]
    fn routes_set_notification_targets() {
        let mut config = AppConfig::default();
        config
            .notifications
            .routes
            .insert("backup-db".into(), vec!["email".into()]);
        config
            .notifications
            .routes
            .insert("no-such-check".into(), vec!["log".into()]);
        let catalog = build_catalog(&config).expect("catalog");
        assert_eq!(
            catalog.get("backup-db").map(|c| c.targets.clone()),
            Some(vec!["email".to_string()])
        );
        assert!(catalog.get("monitor").is_some_and(|c| c.targets.is_empty()));
        assert!(!catalog.contains("no-such-check"));
    }

    #[test]
    fn unsafe_domain_is_rejected() {
        let mut config = AppConfig::default();
        config.ssl.domains = vec!["example.com; rm -rf /".into()];
        let err = build_catalog(&config).expect_err("must reject");
        assert!(matches!(err, CatalogError::InvalidDomain(_)));
    }

    #[test]
    fn empty_ci_command_is_rejected() {
        let mut config = AppConfig::default();
        config.ci.lint = Vec::new();
        let err = build_catalog(&config).expect_err("must reject");
        assert_eq!(
            err.to_string(),
            "ci-checks: the lint command is empty"
        );
    }
}
