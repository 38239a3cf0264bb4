//! CLI command definitions
//!
//! Defines the clap commands for the wtr-jasmine CLI.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

/// How session reports are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON message per line (host protocol)
    #[default]
    Json,
    /// Human-readable tree
    Pretty,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run spec files in a Jasmine session and report the outcome
    Run {
        /// Spec files to import once the runtime is ready
        #[arg(required = true)]
        spec_files: Vec<PathBuf>,

        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Framework executable, overriding the configured one
        #[arg(long)]
        framework: Option<PathBuf>,

        /// Deadline for loading and booting Jasmine, in milliseconds
        #[arg(long)]
        prepare_timeout_ms: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Reduce a recorded lifecycle event log (JSON array) into a run result
    Reduce {
        /// Path to the recorded events
        events: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Print the Jasmine standalone assets the readiness sequence loads
    Assets {
        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
