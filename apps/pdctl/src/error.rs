//! CLI error handling

use std::fmt;

use pd_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(pd_errors::ConfigError),
    /// Engine error
    Ops(pd_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error on a named file
    File {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

impl CliError {
    pub fn file(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| CliError::File {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::File { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::File { source, .. } => Some(source),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<pd_errors::ConfigError> for CliError {
    fn from(e: pd_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<pd_errors::Error> for CliError {
    fn from(e: pd_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<pd_errors::CryptoError> for CliError {
    fn from(e: pd_errors::CryptoError) -> Self {
        CliError::Ops(e.into())
    }
}
