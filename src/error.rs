//! Structured error handling and exit codes.

use serde::Serialize;

use crate::cli::UsageError;

/// Exit codes for filesweeper.
///
/// - 0: Success
/// - 1: General error (fatal failure, nothing more was attempted)
/// - 2: Usage error (bad arguments or configuration, nothing was scanned)
/// - 3: Completed, but some files or folders could not be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every phase completed without errors.
    Success = 0,
    /// General error: an unexpected or fatal error occurred.
    GeneralError = 1,
    /// Usage error: invalid arguments or configuration.
    UsageError = 2,
    /// Partial success: completed with per-file errors.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FS000",
            Self::GeneralError => "FS001",
            Self::UsageError => "FS002",
            Self::PartialSuccess => "FS003",
        }
    }

    /// Exit code for an error that stopped the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<UsageError>().is_some() {
            Self::UsageError
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "FS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Underlying causes, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
