//! Application error types
//!
//! Unified error handling at the application boundary. The gateway crate has
//! its own typed error; this wraps whatever escapes to the binary.

use concord_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: AppError = crate::config::ConfigError::MissingVar("CONCORD_TOKEN").into();
        assert!(err.to_string().contains("CONCORD_TOKEN"));
    }
}
