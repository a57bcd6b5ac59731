//! Exit codes and structured error output.

use serde::Serialize;

/// How the process ends.
///
/// Interruption is reported even when the partial run found duplicates, and
/// recovered per-file errors are reported even when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates reported, nothing went wrong.
    Success = 0,
    /// The run could not start or could not finish.
    GeneralError = 1,
    /// Clean run without a single duplicate group.
    NoDuplicates = 2,
    /// Some entries could not be read; the report covers the rest.
    PartialSuccess = 3,
    /// Ctrl+C; the report covers what was matched before it.
    Interrupted = 130,
}

impl ExitCode {
    /// Value handed to `std::process::exit`.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable `FMxxx` tag used in error messages.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FM000",
            Self::GeneralError => "FM001",
            Self::NoDuplicates => "FM002",
            Self::PartialSuccess => "FM003",
            Self::Interrupted => "FM130",
        }
    }

    /// Pick the exit code for a finished run.
    ///
    /// Interruption wins over recovered errors, which win over an empty result.
    #[must_use]
    pub fn for_outcome(groups: usize, errors: u64, interrupted: bool) -> Self {
        if interrupted {
            Self::Interrupted
        } else if errors > 0 {
            Self::PartialSuccess
        } else if groups == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }
}

/// Fatal error as printed by `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    pub code: String,
    pub exit_code: i32,
    /// Full context chain, outermost first.
    pub message: String,
    pub interrupted: bool,
}

impl StructuredError {
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
