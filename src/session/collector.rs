//! Event collector

use crate::common::{Error, Result};
use crate::jasmine::{BootTrigger, Framework, LifecycleEvent, Reporter};

/// Register a reporter, fire the boot trigger and drain events up to and
/// including `jasmineDone`
///
/// The reporter is registered before the trigger fires, so the first event
/// cannot be missed. The receiver is dropped on return; anything the
/// framework reports afterwards goes nowhere.
pub async fn collect<F: Framework + ?Sized>(
    framework: &mut F,
    boot: BootTrigger,
) -> Result<Vec<LifecycleEvent>> {
    let (reporter, mut rx) = Reporter::channel();
    framework.add_reporter(reporter).await?;

    tracing::debug!("Reporter registered, booting Jasmine");
    boot.fire();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        tracing::trace!(event = event.tag(), index = events.len(), "collected");
        let done = event.is_terminal();
        events.push(event);
        if done {
            tracing::debug!(count = events.len(), "jasmineDone received");
            return Ok(events);
        }
    }

    Err(Error::protocol_violation(format!(
        "event stream closed after {} events without jasmineDone",
        events.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jasmine::scripted::ScriptedFramework;
    use crate::jasmine::{
        AssetManifest, BootStage, JasmineDoneInfo, JasmineStartedInfo, SpecInfo, SpecStatus,
        SuiteInfo,
    };

    async fn prepared(events: Vec<LifecycleEvent>) -> (ScriptedFramework, BootTrigger) {
        let mut framework = ScriptedFramework::new(events);
        let script = AssetManifest::new("/standalone", "4.5.0").boot_script(BootStage::Boot1);
        framework
            .run_boot_script(BootStage::Boot1, &script)
            .await
            .unwrap();
        let boot = framework.take_boot_trigger().unwrap();
        (framework, boot)
    }

    #[tokio::test]
    async fn test_stops_at_jasmine_done() {
        let (mut framework, boot) = prepared(vec![
            LifecycleEvent::JasmineStarted(JasmineStartedInfo::default()),
            LifecycleEvent::SuiteStarted(SuiteInfo::named("s")),
            LifecycleEvent::SpecDone(SpecInfo::done("x", SpecStatus::Passed, vec![])),
            LifecycleEvent::SuiteDone(SuiteInfo::named("s")),
            LifecycleEvent::JasmineDone(JasmineDoneInfo::default()),
            LifecycleEvent::SuiteStarted(SuiteInfo::named("late")),
        ])
        .await;

        let events = collect(&mut framework, boot).await.unwrap();
        assert_eq!(events.len(), 5);
        assert!(events.last().unwrap().is_terminal());
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_reporter_registered_before_boot() {
        let (mut framework, boot) =
            prepared(vec![LifecycleEvent::JasmineDone(JasmineDoneInfo::default())]).await;

        collect(&mut framework, boot).await.unwrap();
        let calls = framework.calls();
        let reporter_at = calls.iter().position(|c| c == "add_reporter").unwrap();
        let boot_at = calls.iter().position(|c| c == "boot").unwrap();
        assert!(reporter_at < boot_at);
    }

    #[tokio::test]
    async fn test_preserves_emission_order() {
        let tags = [
            "jasmineStarted",
            "suiteStarted",
            "specStarted",
            "specDone",
            "suiteDone",
            "jasmineDone",
        ];
        let (mut framework, boot) = prepared(vec![
            LifecycleEvent::JasmineStarted(JasmineStartedInfo::default()),
            LifecycleEvent::SuiteStarted(SuiteInfo::named("s")),
            LifecycleEvent::SpecStarted(SpecInfo::default()),
            LifecycleEvent::SpecDone(SpecInfo::done("x", SpecStatus::Failed, vec![])),
            LifecycleEvent::SuiteDone(SuiteInfo::named("s")),
            LifecycleEvent::JasmineDone(JasmineDoneInfo::default()),
        ])
        .await;

        let events = collect(&mut framework, boot).await.unwrap();
        let seen: Vec<_> = events.iter().map(LifecycleEvent::tag).collect();
        assert_eq!(seen, tags);
    }

    #[tokio::test]
    async fn test_stream_closed_without_done() {
        let (mut framework, boot) =
            prepared(vec![LifecycleEvent::SuiteStarted(SuiteInfo::named("s"))]).await;

        let err = collect(&mut framework, boot).await.unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
    }
}
