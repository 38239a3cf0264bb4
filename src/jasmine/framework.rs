//! Framework collaborator seam
//!
//! A [`Framework`] is whatever hosts the Jasmine runtime: a browser page
//! driven over a wire protocol, or a scripted stand-in in tests. The
//! session only ever talks to it through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::common::Result;

use super::assets::{Asset, BootStage};
use super::types::{JasmineDoneInfo, JasmineStartedInfo, LifecycleEvent, SpecInfo, SuiteInfo};

/// Document load progress of the hosting page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Starts execution of every registered spec when fired
///
/// Obtained from the framework once the second boot stage has run.
pub struct BootTrigger(Box<dyn FnOnce() + Send>);

impl BootTrigger {
    pub fn new(boot: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(boot))
    }

    pub fn fire(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for BootTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BootTrigger")
    }
}

/// Listener handed to the framework, one method per reporter callback
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl Reporter {
    /// Create a reporter and the receiving end the collector drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Forward an event; returns false once nobody is listening
    pub fn report(&self, event: LifecycleEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn jasmine_started(&self, info: JasmineStartedInfo) -> bool {
        self.report(LifecycleEvent::JasmineStarted(info))
    }

    pub fn jasmine_done(&self, info: JasmineDoneInfo) -> bool {
        self.report(LifecycleEvent::JasmineDone(info))
    }

    pub fn suite_started(&self, info: SuiteInfo) -> bool {
        self.report(LifecycleEvent::SuiteStarted(info))
    }

    pub fn suite_done(&self, info: SuiteInfo) -> bool {
        self.report(LifecycleEvent::SuiteDone(info))
    }

    pub fn spec_started(&self, info: SpecInfo) -> bool {
        self.report(LifecycleEvent::SpecStarted(info))
    }

    pub fn spec_done(&self, info: SpecInfo) -> bool {
        self.report(LifecycleEvent::SpecDone(info))
    }
}

/// Host of the Jasmine runtime
#[async_trait]
pub trait Framework: Send {
    /// Framework-defined configuration, passed through untouched
    type Options: Send + Sync;

    /// Attach and execute the runtime assets, resolving once all have loaded
    async fn load_assets(&mut self, assets: &[Asset]) -> Result<()>;

    /// Current document load progress
    async fn ready_state(&mut self) -> Result<ReadyState>;

    /// Resolve when the document's load sequence has completed
    async fn wait_for_load(&mut self) -> Result<()>;

    /// Load and execute one boot script, resolving once it has run
    async fn run_boot_script(&mut self, stage: BootStage, script: &Asset) -> Result<()>;

    /// Take the boot routine installed by the boot scripts, if any
    fn take_boot_trigger(&mut self) -> Option<BootTrigger>;

    /// Apply framework options before specs are registered
    async fn configure(&mut self, options: &Self::Options) -> Result<()>;

    /// Register a reporter for the six lifecycle callbacks
    async fn add_reporter(&mut self, reporter: Reporter) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_stops_after_receiver_dropped() {
        let (reporter, rx) = Reporter::channel();
        assert!(reporter.suite_started(SuiteInfo::named("a")));
        drop(rx);
        assert!(!reporter.jasmine_done(JasmineDoneInfo::default()));
    }

    #[test]
    fn test_boot_trigger_runs_once() {
        let (reporter, mut rx) = Reporter::channel();
        let trigger = BootTrigger::new(move || {
            reporter.jasmine_started(JasmineStartedInfo::default());
        });
        trigger.fire();
        assert_eq!(rx.try_recv().unwrap().tag(), "jasmineStarted");
    }
}
