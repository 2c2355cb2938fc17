//! Error taxonomy for the read path.
//!
//! Only failures that abort the enclosing request are errors. Conditions
//! that are part of normal operation are not represented here: a coordinate
//! outside every grid surfaces as `None` from reader construction, a missing
//! archive chunk fills with NaN, and a missing static file skips elevation
//! correction.

use thiserror::Error;

/// Errors that can abort a read request.
#[derive(Error, Debug)]
pub enum ReadError {
    /// A chunk file was present but could not be decoded. Fatal for the
    /// enclosing request only; carries the chunk identity for logs.
    #[error("corrupt chunk {path}: {reason}")]
    DecodeFailure { path: String, reason: String },

    /// An upstream object-store fetch exceeded its deadline.
    #[error("upstream fetch timed out: {path}")]
    Timeout { path: String },

    /// The outer request was cancelled; propagated silently.
    #[error("request cancelled")]
    Cancelled,

    /// A variable tag reached the reader that no domain declares.
    /// Programmer error, never expected at runtime.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// Storage backend failure other than NotFound.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ReadError {
    /// Create a DecodeFailure error.
    pub fn decode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the caller should advise a retry.
    ///
    /// True only for deadline expiry; decode failures and unknown variables
    /// will not get better on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for read operations.
pub type ReadResult<T> = std::result::Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_advisory() {
        let timeout = ReadError::Timeout {
            path: "icon/temperature_2m/chunk_18920.dat".to_string(),
        };
        assert!(timeout.is_retryable());

        let decode = ReadError::decode("gfs025/precipitation/chunk_3.dat", "bad magic");
        assert!(!decode.is_retryable());
        assert!(!ReadError::Cancelled.is_retryable());
    }
}
