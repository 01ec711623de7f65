//! Relay error types.
//!
//! Endpoint I/O failures are not represented here. They terminate the
//! read loop that observed them and tear down at most one session or
//! one bridge entry. The only process-fatal condition is failing to
//! stand up the listener.

use thiserror::Error;

/// Relay error type.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The configured listen address could not be parsed
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    /// The listener could not be bound
    #[error("failed to bind listener: {0}")]
    Bind(String),

    /// The server failed while serving
    #[error("server error: {0}")]
    Serve(String),
}

/// Result type alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::Bind("0.0.0.0:8080: address in use".to_string());
        assert_eq!(
            err.to_string(),
            "failed to bind listener: 0.0.0.0:8080: address in use"
        );
    }
}
