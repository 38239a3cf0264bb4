//! Readiness gate
//!
//! Brings the Jasmine runtime up to the point where specs can be registered
//! and booted, under a hard deadline.

use std::time::{Duration, Instant};

use crate::common::{Error, Result};
use crate::jasmine::{AssetManifest, BootStage, BootTrigger, Framework, ReadyState};

/// Deadline for the whole readiness sequence
pub const DEFAULT_PREPARE_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Loads, waits for page load, then boots, racing a timeout
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    manifest: AssetManifest,
    timeout: Duration,
}

impl ReadinessGate {
    pub fn new(manifest: AssetManifest, timeout: Duration) -> Self {
        Self { manifest, timeout }
    }

    /// Run the readiness sequence and return the boot routine it produced
    ///
    /// A step that never resolves loses the race and yields
    /// [`Error::PreparationTimeout`]. Assets a step already attached are
    /// left in place.
    #[tracing::instrument(skip_all, fields(timeout_ms = self.timeout.as_millis() as u64))]
    pub async fn prepare<F: Framework + ?Sized>(&self, framework: &mut F) -> Result<BootTrigger> {
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, self.boot(framework)).await {
            Ok(result) => {
                if result.is_ok() {
                    tracing::info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Jasmine runtime ready"
                    );
                }
                result
            }
            Err(_) => {
                tracing::warn!("Jasmine runtime not ready before deadline");
                Err(Error::PreparationTimeout {
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    async fn boot<F: Framework + ?Sized>(&self, framework: &mut F) -> Result<BootTrigger> {
        let assets = self.manifest.runtime_assets();
        tracing::debug!(count = assets.len(), base = self.manifest.base(), "Loading runtime assets");
        framework.load_assets(&assets).await?;

        // Boot must not run before the page's own load handlers; some boot
        // sequences hook themselves into onload.
        match framework.ready_state().await? {
            ReadyState::Complete => tokio::task::yield_now().await,
            state => {
                tracing::debug!(?state, "Waiting for page load");
                framework.wait_for_load().await?;
            }
        }

        for stage in BootStage::ALL {
            let script = self.manifest.boot_script(stage);
            tracing::debug!(%stage, url = %script.url, "Running boot script");
            framework.run_boot_script(stage, &script).await?;
        }

        framework.take_boot_trigger().ok_or_else(|| {
            Error::AssetLoadFailure(format!(
                "{} did not install a boot routine",
                BootStage::Boot1.file_name()
            ))
        })
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(
            AssetManifest::from_config(&Default::default()),
            DEFAULT_PREPARE_TIMEOUT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jasmine::scripted::{Hang, ScriptedFramework};

    fn gate(timeout_ms: u64) -> ReadinessGate {
        ReadinessGate::new(
            AssetManifest::new("/jasmine-standalone", "4.5.0"),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn test_sequence_when_page_already_loaded() {
        let mut framework = ScriptedFramework::new(Vec::new());

        gate(1_000).prepare(&mut framework).await.unwrap();
        assert_eq!(
            framework.calls(),
            ["load_assets:4", "ready_state", "boot_script:boot0", "boot_script:boot1"]
        );
    }

    #[tokio::test]
    async fn test_waits_for_load_when_page_loading() {
        let mut framework = ScriptedFramework::new(Vec::new());
        framework.ready_state = ReadyState::Loading;

        gate(1_000).prepare(&mut framework).await.unwrap();
        let calls = framework.calls();
        let load_at = calls.iter().position(|c| c == "wait_for_load").unwrap();
        let boot0_at = calls.iter().position(|c| c == "boot_script:boot0").unwrap();
        assert!(load_at < boot0_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_during_assets_times_out() {
        let mut framework = ScriptedFramework::new(Vec::new());
        framework.hang = Some(Hang::Assets);

        let started = tokio::time::Instant::now();
        let err = gate(10_000).prepare(&mut framework).await.unwrap_err();
        assert!(matches!(err, Error::PreparationTimeout { timeout_ms: 10_000 }));

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(10_000));
        assert!(elapsed < Duration::from_millis(10_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_in_second_boot_stage_times_out() {
        let mut framework = ScriptedFramework::new(Vec::new());
        framework.hang = Some(Hang::Boot(BootStage::Boot1));

        let err = gate(250).prepare(&mut framework).await.unwrap_err();
        assert!(matches!(err, Error::PreparationTimeout { timeout_ms: 250 }));
        assert!(framework.calls().contains(&"boot_script:boot0".to_string()));
    }

    #[tokio::test]
    async fn test_asset_error_surfaces_immediately() {
        let mut framework = ScriptedFramework::new(Vec::new());
        framework.fail_assets = true;

        let err = gate(10_000).prepare(&mut framework).await.unwrap_err();
        assert!(matches!(err, Error::AssetLoadFailure(_)));
    }

    #[tokio::test]
    async fn test_missing_boot_routine() {
        let mut framework = ScriptedFramework::new(Vec::new());
        framework.install_boot = false;

        let err = gate(1_000).prepare(&mut framework).await.unwrap_err();
        assert!(err.to_string().contains("boot1.js"));
    }
}
