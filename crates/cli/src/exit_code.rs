//! Exit code definitions for the bx CLI
//!
//! Scripts rely on these values. Changing one is a breaking change.

use bx_core::Error;

/// Process exit status of a bx command
///
/// Every core error kind maps to exactly one code through
/// [`Error::exit_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// User input error: invalid arguments, malformed path or name
    UsageError = 2,

    /// Retryable error: timeout, connection reset, 5xx
    NetworkError = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// Resource not found: bucket, object or upload session
    NotFound = 5,

    /// Conflict: rename target exists, precondition failed
    Conflict = 6,

    /// Operation was interrupted (e.g., Ctrl+C)
    Interrupted = 130,
}

impl ExitCode {
    /// Value passed to `std::process::exit`
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Short description shown in `Display`
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments, path or name",
            Self::NetworkError => "Dashboard unreachable or failing (retryable)",
            Self::AuthError => "Dashboard rejected the credentials",
            Self::NotFound => "Object, folder or alias not found",
            Self::Conflict => "Name already taken or precondition failed",
            Self::Interrupted => "Operation interrupted",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error.exit_code() {
            2 => Self::UsageError,
            3 => Self::NetworkError,
            4 => Self::AuthError,
            5 => Self::NotFound,
            6 => Self::Conflict,
            _ => Self::GeneralError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::NetworkError.as_i32(), 3);
        assert_eq!(ExitCode::AuthError.as_i32(), 4);
        assert_eq!(ExitCode::NotFound.as_i32(), 5);
        assert_eq!(ExitCode::Conflict.as_i32(), 6);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_exit_code_matches_core_table() {
        let errors = [
            Error::InvalidPath("x".into()),
            Error::Transport("x".into()),
            Error::Auth("x".into()),
            Error::AliasNotFound("x".into()),
            Error::AliasExists("x".into()),
            Error::Io(std::io::Error::other("x")),
        ];
        for error in &errors {
            assert_eq!(ExitCode::from(error).as_i32(), error.exit_code());
        }
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from(&Error::Transport("reset".into())),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::from(&Error::Server("502".into())),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::from(&Error::Validation("bad".into())),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from(&Error::Conflict("exists".into())),
            ExitCode::Conflict
        );
        assert_eq!(
            ExitCode::from(&Error::NotFound("a.txt".into())),
            ExitCode::NotFound
        );
        assert_eq!(ExitCode::from(&Error::Auth("401".into())), ExitCode::AuthError);
    }

    #[test]
    fn test_exit_code_display() {
        let display = format!("{}", ExitCode::NotFound);
        assert!(display.contains("5"));
        assert!(display.contains("not found"));
    }
}
