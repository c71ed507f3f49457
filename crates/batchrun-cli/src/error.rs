//! CLI errors and their exit codes.

use std::process::ExitCode;

use batchrun_core::CoreError;
use thiserror::Error;

/// Exit code when every item succeeded.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when the run finished but some items failed.
pub const EXIT_FAILURES: u8 = 1;
/// Exit code for invalid configuration or input; nothing was run.
pub const EXIT_INVALID: u8 = 2;
/// Exit code for environment problems such as unwritable output.
pub const EXIT_ERROR: u8 = 3;

/// Errors surfaced by the CLI before or after a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    ConfigFile {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        let code = match self {
            Self::Core(e) if e.is_usage_error() => EXIT_INVALID,
            Self::Read { .. } | Self::ConfigFile { .. } => EXIT_INVALID,
            _ => EXIT_ERROR,
        };
        ExitCode::from(code)
    }
}
