//! wtr-jasmine - Jasmine session adapter
//!
//! Turns the lifecycle events Jasmine reports during a run into a
//! hierarchical pass/fail report for a test-orchestration host.

pub mod cli;
pub mod commands;
pub mod common;
pub mod jasmine;
pub mod session;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use jasmine::{Framework, LifecycleEvent};
pub use session::{RunResult, SessionController, SessionHost, SessionOutcome};
