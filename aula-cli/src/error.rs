//! CLI-specific error types with exit codes.
//!
//! Wraps library errors and maps every failure mode to a stable exit
//! code so scripts can branch on outcomes.

use std::fmt;

use aula::Error as LibError;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// Connection pool saturated or exhausted.
    PoolUnavailable(String),

    /// Database not found (and auto-create disabled).
    NoDatabase,

    /// Configuration error.
    Config(String),

    /// Semantic failure (conflicting booking, blocked assignment).
    Conflict(String),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Semantic failure (conflicts, blocked transitions)
    /// - 2: Connection pool saturated or exhausted
    /// - 3: Database not found
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Other library error
    /// - 7: Configuration error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Conflict(_) => 1,
            CliError::Library(lib_err) => match lib_err {
                LibError::DoubleBooking { .. } | LibError::InvalidTransition { .. } => 1,
                LibError::PoolSaturated { .. } | LibError::ConnectionUnavailable { .. } => 2,
                _ => 6,
            },
            CliError::PoolUnavailable(_) => 2,
            CliError::NoDatabase => 3,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Config(_) => 7,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::PoolUnavailable(msg) => write!(f, "Pool unavailable: {msg}"),
            CliError::NoDatabase => {
                write!(f, "Database not found (run `aula init` or use --data-dir)")
            }
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::Conflict(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        if e.is_pool_exhaustion() {
            CliError::PoolUnavailable(e.to_string())
        } else {
            CliError::Library(e)
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
