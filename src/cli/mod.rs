//! CLI command handling
//!
//! Dispatches CLI commands and maps session outcomes to exit codes.

mod report;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::{Commands, OutputFormat};
use crate::common::{config::Config, Error, Result};
use crate::jasmine::{AssetManifest, BootStage, LifecycleEvent, ProcessFramework};
use crate::session::{
    reduce, JsonLinesHost, ReadinessGate, SessionController, SessionHost, SessionOutcome,
};

pub use report::{render, PrettyHost};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            spec_files,
            config,
            framework,
            prepare_timeout_ms,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            let timeout =
                Duration::from_millis(prepare_timeout_ms.unwrap_or(config.timeouts.prepare_ms));
            let gate = ReadinessGate::new(AssetManifest::from_config(&config.jasmine), timeout);

            let spec_files: Vec<PathBuf> = spec_files
                .into_iter()
                .map(|f| f.canonicalize().unwrap_or(f))
                .collect();

            let session = RunSession {
                config: &config,
                framework,
                gate,
                spec_files,
            };

            let outcome = match format {
                OutputFormat::Json => session.run(JsonLinesHost::new(std::io::stdout())).await?,
                OutputFormat::Pretty => session.run(PrettyHost).await?,
            };
            Ok(outcome.exit_code())
        }

        Commands::Reduce { events, format } => {
            let content = std::fs::read_to_string(&events).map_err(|e| Error::FileRead {
                path: events.display().to_string(),
                error: e.to_string(),
            })?;
            let events: Vec<LifecycleEvent> = serde_json::from_str(&content)?;
            let result = reduce(&events)?;
            let code = if result.passed { 0 } else { 1 };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Pretty => print!("{}", render(&result)),
            }
            Ok(code)
        }

        Commands::Assets { config } => {
            let config = load_config(config.as_deref())?;
            let manifest = AssetManifest::from_config(&config.jasmine);

            let boot = BootStage::ALL.map(|stage| manifest.boot_script(stage));
            for asset in manifest.runtime_assets().iter().chain(boot.iter()) {
                println!("{:<12} {}", format!("{:?}", asset.kind).to_lowercase(), asset.url);
            }
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Everything a `run` needs before a framework exists
struct RunSession<'a> {
    config: &'a Config,
    framework: Option<PathBuf>,
    gate: ReadinessGate,
    spec_files: Vec<PathBuf>,
}

impl RunSession<'_> {
    async fn spawn_framework(&self) -> Result<ProcessFramework> {
        let path = match &self.framework {
            Some(path) => path.clone(),
            None => self.config.framework_executable()?,
        };
        ProcessFramework::spawn(&path, &self.config.framework.args).await
    }

    async fn run<H: SessionHost>(self, mut host: H) -> Result<SessionOutcome> {
        // A framework that cannot start is still one failed session
        let framework = match self.spawn_framework().await {
            Ok(framework) => framework,
            Err(e) => {
                tracing::error!("Session failed: {}", e);
                host.session_started()?;
                host.session_failed(e)?;
                return Ok(SessionOutcome::Errored);
            }
        };

        let client = framework.client();
        let spec_files = self.spec_files;
        SessionController::new(
            framework,
            host,
            self.gate,
            self.config.framework.options.clone(),
        )
        .run(move || async move { client.import_specs(&spec_files).await })
        .await
    }
}
