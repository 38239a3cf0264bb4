//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Test framework process settings
    #[serde(default)]
    pub framework: FrameworkConfig,

    /// Jasmine standalone distribution settings
    #[serde(default)]
    pub jasmine: JasmineConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Configuration for the test framework process
#[derive(Debug, Deserialize, Clone)]
pub struct FrameworkConfig {
    /// Path or name of the framework executable
    #[serde(default = "default_framework")]
    pub path: PathBuf,

    /// Additional arguments to pass to the framework
    #[serde(default)]
    pub args: Vec<String>,

    /// Options handed to the framework untouched (`testFrameworkConfig`)
    #[serde(default)]
    pub options: serde_json::Value,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            path: default_framework(),
            args: Vec::new(),
            options: serde_json::Value::Null,
        }
    }
}

fn default_framework() -> PathBuf {
    PathBuf::from("jasmine-host")
}

/// Jasmine standalone distribution settings
#[derive(Debug, Deserialize, Clone)]
pub struct JasmineConfig {
    /// Jasmine release whose standalone assets are loaded
    #[serde(default = "default_version")]
    pub version: String,

    /// Base URL of the unpacked `jasmine-standalone` distribution
    #[serde(default = "default_standalone_url")]
    pub standalone_url: String,
}

impl Default for JasmineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            standalone_url: default_standalone_url(),
        }
    }
}

fn default_version() -> String {
    "4.5.0".to_string()
}
fn default_standalone_url() -> String {
    "/jasmine-standalone".to_string()
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Deadline for loading and booting the framework runtime
    #[serde(default = "default_prepare")]
    pub prepare_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            prepare_ms: default_prepare(),
        }
    }
}

fn default_prepare() -> u64 {
    10_000
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve the framework executable
    ///
    /// Paths with a directory component are used as given; bare names are
    /// searched in PATH.
    pub fn framework_executable(&self) -> Result<PathBuf> {
        let path = &self.framework.path;
        if path.components().count() > 1 || path.is_absolute() {
            return Ok(path.clone());
        }

        let name = path.to_string_lossy();
        which::which(path).map_err(|_| Error::framework_not_found(&name, &["PATH"]))
    }
}
