//! Session controller
//!
//! Sequences one run: readiness, spec registration, collection, reduction.
//! Everything that can fail inside the run is caught in one place and
//! reported to the host exactly once.

use std::fmt::Display;
use std::future::Future;

use crate::common::{Error, Result};
use crate::jasmine::Framework;

use super::collector::collect;
use super::gate::ReadinessGate;
use super::host::SessionHost;
use super::reducer::{reduce, RunResult};

/// How a session ended, as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Finished and every spec passed or was skipped
    Passed,
    /// Finished with at least one failing spec
    TestsFailed,
    /// Reported through `sessionFailed`
    Errored,
}

impl SessionOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::TestsFailed => 1,
            Self::Errored => 2,
        }
    }
}

/// Drives one session against a framework and reports to a host
pub struct SessionController<F: Framework, H: SessionHost> {
    framework: F,
    host: H,
    gate: ReadinessGate,
    /// Handed to the framework untouched
    options: F::Options,
}

impl<F: Framework, H: SessionHost> SessionController<F, H> {
    pub fn new(framework: F, host: H, gate: ReadinessGate, options: F::Options) -> Self {
        Self {
            framework,
            host,
            gate,
            options,
        }
    }

    /// Run the session
    ///
    /// `register` is awaited after the runtime is ready; once it resolves all
    /// spec declarations must be registered. The returned `Result` only
    /// carries failures to talk to the host itself.
    pub async fn run<R, Fut, E>(mut self, register: R) -> Result<SessionOutcome>
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        self.host.session_started()?;
        tracing::info!("Session started");

        match self.execute(register).await {
            Ok(result) => {
                let tally = result.test_results.tally();
                tracing::info!(
                    passed = result.passed,
                    specs = tally.total(),
                    failed = tally.failed,
                    "Session finished"
                );
                let outcome = if result.passed {
                    SessionOutcome::Passed
                } else {
                    SessionOutcome::TestsFailed
                };
                self.host.session_finished(result)?;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Session failed: {}", e);
                self.host.session_failed(e)?;
                Ok(SessionOutcome::Errored)
            }
        }
    }

    async fn execute<R, Fut, E>(&mut self, register: R) -> Result<RunResult>
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        let boot = self.gate.prepare(&mut self.framework).await?;

        self.framework.configure(&self.options).await?;
        register()
            .await
            .map_err(|e| Error::SpecRegistration(e.to_string()))?;
        tracing::debug!("Specs registered");

        let events = collect(&mut self.framework, boot).await?;
        reduce(&events)
    }
}
