//! CLI error handling with semantic exit codes.
//!
//! Errors are categorized so shell scripts and cron wrappers can react to
//! the kind of failure without parsing messages.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or configuration |
//! | 3 | `NotFound` | Requested resource not found |
//! | 4 | `DataSource` | Site snapshot or plugin source unreadable |
//! | 5 | `Persistence` | Sitemap or scheduler state could not be written |
//! | 6 | `AccessDenied` | Wrong scheduler override key |
//!
//! # Usage
//!
//! ```bash
//! sitemapper cron --key "$KEY"
//! case $? in
//!     0) echo "ok" ;;
//!     6) echo "bad key" ;;
//!     *) echo "failed" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

use sitemapper_core::Error as CoreError;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    Usage = 2,

    /// Requested resource not found (exit code 3).
    NotFound = 3,

    /// Site snapshot or plugin data unavailable (exit code 4).
    DataSource = 4,

    /// Output could not be persisted (exit code 5).
    Persistence = 5,

    /// Access refused, e.g. a wrong override key (exit code 6).
    AccessDenied = 6,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::DataSource => "data source error",
            Self::Persistence => "persistence error",
            Self::AccessDenied => "access denied",
        }
    }

    /// Category for a core library error.
    #[must_use]
    pub const fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::Config(_) | CoreError::InvalidUrl(_) => Self::Usage,
            CoreError::NotFound(_) => Self::NotFound,
            CoreError::DataSourceUnavailable(_) | CoreError::PluginRecordInvalid { .. } => {
                Self::DataSource
            },
            CoreError::Persistence(_) => Self::Persistence,
            CoreError::AccessDenied(_) => Self::AccessDenied,
            CoreError::Io(_) | CoreError::Parse(_) | CoreError::Serialization(_) => {
                Self::Internal
            },
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// Wraps an `anyhow::Error` so context chains survive.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// An explicit [`CliError`] wins; otherwise the first core error in the
/// chain decides. Anything else is internal.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }

    err.chain()
        .find_map(|cause| cause.downcast_ref::<CoreError>())
        .map_or(ErrorCategory::Internal, ErrorCategory::from_core)
        .exit_code()
}
