//! Jasmine standalone asset layout
//!
//! The standalone distribution keeps all runtime files under
//! `lib/jasmine-<version>/`.

use serde::{Deserialize, Serialize};

use crate::common::config::JasmineConfig;

/// What kind of element an asset is attached as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Icon,
    Stylesheet,
    Script,
}

/// A single runtime asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,
    pub url: String,
}

/// The two boot scripts, run strictly in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootStage {
    /// Creates the Jasmine environment and installs the global interface
    Boot0,
    /// Configures the environment and installs the boot routine
    Boot1,
}

impl BootStage {
    pub const ALL: [BootStage; 2] = [BootStage::Boot0, BootStage::Boot1];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Boot0 => "boot0.js",
            Self::Boot1 => "boot1.js",
        }
    }
}

impl std::fmt::Display for BootStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boot0 => write!(f, "boot0"),
            Self::Boot1 => write!(f, "boot1"),
        }
    }
}

/// URLs of every file the readiness sequence loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    base: String,
}

impl AssetManifest {
    pub fn new(standalone_url: &str, version: &str) -> Self {
        Self {
            base: format!(
                "{}/lib/jasmine-{}",
                standalone_url.trim_end_matches('/'),
                version
            ),
        }
    }

    pub fn from_config(config: &JasmineConfig) -> Self {
        Self::new(&config.standalone_url, &config.version)
    }

    /// Directory all assets live in
    pub fn base(&self) -> &str {
        &self.base
    }

    fn asset(&self, kind: AssetKind, file: &str) -> Asset {
        Asset {
            kind,
            url: format!("{}/{}", self.base, file),
        }
    }

    /// Icon, stylesheet and core scripts, in document order
    pub fn runtime_assets(&self) -> Vec<Asset> {
        vec![
            self.asset(AssetKind::Icon, "jasmine_favicon.png"),
            self.asset(AssetKind::Stylesheet, "jasmine.css"),
            self.asset(AssetKind::Script, "jasmine.js"),
            self.asset(AssetKind::Script, "jasmine-html.js"),
        ]
    }

    pub fn boot_script(&self, stage: BootStage) -> Asset {
        self.asset(AssetKind::Script, stage.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_layout() {
        let manifest = AssetManifest::new("http://localhost:8000/jasmine-standalone/", "4.5.0");
        assert_eq!(
            manifest.base(),
            "http://localhost:8000/jasmine-standalone/lib/jasmine-4.5.0"
        );

        let urls: Vec<_> = manifest
            .runtime_assets()
            .into_iter()
            .map(|a| a.url.rsplit('/').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            urls,
            ["jasmine_favicon.png", "jasmine.css", "jasmine.js", "jasmine-html.js"]
        );
    }

    #[test]
    fn test_boot_scripts_are_scripts() {
        let manifest = AssetManifest::from_config(&JasmineConfig::default());
        let boot1 = manifest.boot_script(BootStage::Boot1);
        assert_eq!(boot1.kind, AssetKind::Script);
        assert!(boot1.url.ends_with("/lib/jasmine-4.5.0/boot1.js"));
    }
}
