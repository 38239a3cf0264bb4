//! Test session lifecycle
//!
//! A session runs once: the readiness gate boots Jasmine, specs register,
//! the collector drains lifecycle events until `jasmineDone`, and the
//! reducer turns them into the report the host receives.

pub mod collector;
pub mod controller;
pub mod gate;
pub mod host;
pub mod reducer;

pub use collector::collect;
pub use controller::{SessionController, SessionOutcome};
pub use gate::{ReadinessGate, DEFAULT_PREPARE_TIMEOUT};
pub use host::{HostMessage, JsonLinesHost, SessionHost};
pub use reducer::{reduce, summarize_failures, RunResult, SuiteResult, SummarizedError, Tally, TestResult};
