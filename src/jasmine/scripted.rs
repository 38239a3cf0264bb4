//! In-process framework double for unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::common::{Error, Result};

use super::assets::{Asset, BootStage};
use super::framework::{BootTrigger, Framework, ReadyState, Reporter};
use super::types::LifecycleEvent;

/// Step at which the scripted framework stops responding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hang {
    Assets,
    PageLoad,
    Boot(BootStage),
}

/// Plays back a fixed event list when booted and records every call
pub struct ScriptedFramework {
    pub ready_state: ReadyState,
    pub hang: Option<Hang>,
    pub fail_assets: bool,
    pub install_boot: bool,
    /// Events emitted synchronously when the boot trigger fires
    pub events: Vec<LifecycleEvent>,
    pub calls: Arc<Mutex<Vec<String>>>,
    reporter: Arc<Mutex<Option<Reporter>>>,
    booted: bool,
}

impl ScriptedFramework {
    pub fn new(events: Vec<LifecycleEvent>) -> Self {
        Self {
            ready_state: ReadyState::Complete,
            hang: None,
            fail_assets: false,
            install_boot: true,
            events,
            calls: Arc::new(Mutex::new(Vec::new())),
            reporter: Arc::new(Mutex::new(None)),
            booted: false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    async fn maybe_hang(&self, at: Hang) {
        if self.hang == Some(at) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Framework for ScriptedFramework {
    type Options = String;

    async fn load_assets(&mut self, assets: &[Asset]) -> Result<()> {
        self.record(format!("load_assets:{}", assets.len()));
        self.maybe_hang(Hang::Assets).await;
        if self.fail_assets {
            return Err(Error::AssetLoadFailure("jasmine.js: 404".to_string()));
        }
        Ok(())
    }

    async fn ready_state(&mut self) -> Result<ReadyState> {
        self.record("ready_state");
        Ok(self.ready_state)
    }

    async fn wait_for_load(&mut self) -> Result<()> {
        self.record("wait_for_load");
        self.maybe_hang(Hang::PageLoad).await;
        Ok(())
    }

    async fn run_boot_script(&mut self, stage: BootStage, _script: &Asset) -> Result<()> {
        self.record(format!("boot_script:{}", stage));
        self.maybe_hang(Hang::Boot(stage)).await;
        if stage == BootStage::Boot1 {
            self.booted = self.install_boot;
        }
        Ok(())
    }

    fn take_boot_trigger(&mut self) -> Option<BootTrigger> {
        if !std::mem::take(&mut self.booted) {
            return None;
        }
        let reporter = Arc::clone(&self.reporter);
        let calls = Arc::clone(&self.calls);
        let events = self.events.clone();
        Some(BootTrigger::new(move || {
            calls.lock().unwrap().push("boot".to_string());
            // Taking the reporter closes the channel once playback ends
            let reporter = reporter.lock().unwrap().take();
            if let Some(reporter) = reporter {
                for event in events {
                    reporter.report(event);
                }
            }
        }))
    }

    async fn configure(&mut self, options: &String) -> Result<()> {
        self.record(format!("configure:{}", options));
        Ok(())
    }

    async fn add_reporter(&mut self, reporter: Reporter) -> Result<()> {
        self.record("add_reporter");
        *self.reporter.lock().unwrap() = Some(reporter);
        Ok(())
    }
}
