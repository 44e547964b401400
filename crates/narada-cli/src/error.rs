//! CLI-specific error types and mappings.
//!
//! Library errors are folded into [`CliError`] so `main` can pick an exit
//! code without knowing which crate raised them.

use narada_core::{PathError, PresetError, StoreError};
use narada_runtime::{ProbeError, RuntimeError, ServiceError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or console input error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration or path resolution error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A preset, stream or settings document could not be used.
    #[error("{0}")]
    Store(String),

    /// A service could not be started.
    #[error("{0}")]
    Service(String),

    /// The license check completed with an invalid verdict.
    #[error("License invalid: {0}")]
    Unlicensed(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Unlicensed(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Store(_) => 65,    // EX_DATAERR
            Self::Service(_) => 69,  // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Storage(msg) => Self::Io(msg),
            StoreError::Invalid(msg) => Self::Config(msg),
            StoreError::Preset(PresetError::EmptyName) => {
                Self::Arguments(PresetError::EmptyName.to_string())
            }
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err.to_string())
    }
}

impl From<RuntimeError> for CliError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Store(e) => e.into(),
            RuntimeError::Service(e) => e.into(),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ProbeError> for CliError {
    fn from(err: ProbeError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Arguments(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_categories() {
        let io: CliError = StoreError::Storage("disk full".into()).into();
        assert_eq!(io.exit_code(), 74);

        let builtin: CliError = StoreError::from(PresetError::BuiltinImmutable("standard".into())).into();
        assert_eq!(builtin.exit_code(), 65);
        assert_eq!(
            builtin.to_string(),
            "Preset 'standard' is built-in and cannot be modified"
        );

        let empty: CliError = StoreError::from(PresetError::EmptyName).into();
        assert_eq!(empty.exit_code(), 2);
    }

    #[test]
    fn service_errors_keep_their_message() {
        let err: CliError = ServiceError::Unlicensed(narada_core::ServiceKind::Relay).into();
        assert_eq!(err.exit_code(), 69);
        assert_eq!(err.to_string(), "License is not valid; Relay not started");
    }
}
