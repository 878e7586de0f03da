use std::sync::{Mutex, PoisonError};

use futures::future::join_all;
use thiserror::Error;

use crate::application::catalog::Catalog;
use crate::application::services::alerter::Alerter;
use crate::application::services::runner::CheckRunner;
use crate::domain::entities::check::CheckDefinition;
use crate::domain::entities::result::CheckResult;
use crate::domain::ports::collector::Collector;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown check '{0}' (run `opsguard list` to see available checks)")]
    UnknownCheck(String),
}

/// Observable dispatcher state. Results are returned, not stored, so a
/// finished run goes straight back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Running(Vec<String>),
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running(names) => write!(f, "running({})", names.join(", ")),
        }
    }
}

/// Maps check names to definitions, runs them, and alerts on the outcome.
pub struct Dispatcher<'a> {
    catalog: &'a Catalog,
    runner: CheckRunner<'a>,
    alerter: &'a Alerter,
    state: Mutex<DispatchState>,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, collector: &'a dyn Collector, alerter: &'a Alerter) -> Self {
        Self {
            catalog,
            runner: CheckRunner::new(collector),
            alerter,
            state: Mutex::new(DispatchState::Idle),
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.catalog
    }

    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn transition(&self, next: DispatchState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!("dispatcher state: {} -> {next}", *state);
        *state = next;
    }

    /// # Errors
    ///
    /// Returns `DispatchError::UnknownCheck` if no check has this name.
    pub fn lookup(&self, name: &str) -> Result<&'a CheckDefinition, DispatchError> {
        self.catalog
            .get(name)
            .ok_or_else(|| DispatchError::UnknownCheck(name.to_string()))
    }

    /// Runs one named check, then alerts its targets.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownCheck` before any external command runs
    /// if the name is not registered.
    pub async fn dispatch(&self, name: &str) -> Result<CheckResult, DispatchError> {
        let definition = self.lookup(name)?;
        self.transition(DispatchState::Running(vec![definition.name.clone()]));
        let result = self.execute(definition).await;
        self.transition(DispatchState::Idle);
        Ok(result)
    }

    /// Runs several checks, sequentially or concurrently. Results are
    /// sorted by check name either way.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownCheck` if any name is unknown; in that
    /// case no check runs at all.
    pub async fn dispatch_all(
        &self,
        names: &[String],
        parallel: bool,
    ) -> Result<Vec<CheckResult>, DispatchError> {
        let definitions = names
            .iter()
            .map(|name| self.lookup(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = if parallel {
            self.transition(DispatchState::Running(
                definitions.iter().map(|d| d.name.clone()).collect(),
            ));
            join_all(definitions.iter().map(|d| self.execute(d))).await
        } else {
            let mut results = Vec::with_capacity(definitions.len());
            for definition in &definitions {
                self.transition(DispatchState::Running(vec![definition.name.clone()]));
                results.push(self.execute(definition).await);
            }
            results
        };
        self.transition(DispatchState::Idle);

        results.sort_by(|a, b| a.check.cmp(&b.check));
        Ok(results)
    }

    async fn execute(&self, definition: &CheckDefinition) -> CheckResult {
        tracing::info!(check = %definition.name, "check started");
        let result = self.runner.run(definition).await;
        tracing::info!(
            check = %result.check,
            status = %result.status,
            "check finished: {}",
            result.message
        );

        let report = self.alerter.notify(&result, &definition.targets).await;
        if report.failed > 0 {
            tracing::warn!(
                check = %result.check,
                failed = report.failed,
                delivered = report.delivered,
                "some alerts could not be delivered"
            );
        }
        result
    }
}

/// Process exit code for a set of results: 0 iff every result is OK.
#[must_use]
pub fn exit_code(results: &[CheckResult]) -> u8 {
    u8::from(!results.iter().all(|r| r.status.is_ok()))
}
