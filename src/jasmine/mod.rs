//! Jasmine runtime collaborator
//!
//! Types for Jasmine's reporter callbacks, the standalone asset layout, and
//! the [`Framework`] seam through which a session drives the runtime.

pub mod assets;
pub mod codec;
pub mod framework;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod scripted;

pub use assets::{Asset, AssetKind, AssetManifest, BootStage};
pub use framework::{BootTrigger, Framework, ReadyState, Reporter};
pub use process::{FrameworkClient, ProcessFramework};
pub use types::*;
