//! Bridge errors
//!
//! Every failure the engine can produce is a `BridgeError`. At the dispatch
//! boundary each one becomes a `CallResult::Failure` carrying the error's
//! message and its `code()` (or the native detail for invocation failures).

use tether_sdk::NativeError;

/// Errors produced while decoding or resolving a descriptor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Malformed request (missing name, bad kind, missing id, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A root descriptor whose kind is neither global nor type
    #[error("Unsupported root kind: {0}")]
    UnsupportedRoot(String),

    /// A child descriptor whose kind is neither method nor field
    #[error("Unsupported operation kind: {0}")]
    UnsupportedOperation(String),

    /// A root name is unknown, or a parent resolved to null
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// No member with the requested name and arity
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// The native member itself failed
    #[error("{message}")]
    InvocationFailure {
        /// Message raised by the native member
        message: String,
        /// Detail raised by the native member
        detail: String,
    },

    /// The access policy forbids the resolved member
    #[error("Access denied: {0}")]
    AccessDenied(String),
}

impl BridgeError {
    /// Stable error code, reported as the failure detail
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Validation(_) => "ValidationError",
            BridgeError::UnsupportedRoot(_) => "UnsupportedRoot",
            BridgeError::UnsupportedOperation(_) => "UnsupportedOperation",
            BridgeError::TargetNotFound(_) => "TargetNotFound",
            BridgeError::MemberNotFound(_) => "MemberNotFound",
            BridgeError::InvocationFailure { .. } => "InvocationFailure",
            BridgeError::AccessDenied(_) => "AccessDenied",
        }
    }

    /// Message reported to the client
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Detail reported to the client
    pub fn detail(&self) -> String {
        match self {
            BridgeError::InvocationFailure { detail, .. } => detail.clone(),
            other => other.code().to_string(),
        }
    }
}

impl From<NativeError> for BridgeError {
    fn from(err: NativeError) -> Self {
        BridgeError::InvocationFailure {
            message: err.message(),
            detail: err.detail(),
        }
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_is_code() {
        let err = BridgeError::MemberNotFound("foo/1 on host.Counter".to_string());
        assert_eq!(err.detail(), "MemberNotFound");
        assert!(err.message().contains("foo/1"));
    }

    #[test]
    fn test_native_error_keeps_detail() {
        let err: BridgeError = NativeError::raised("boom", "IllegalState").into();
        assert_eq!(err.code(), "InvocationFailure");
        assert_eq!(err.message(), "boom");
        assert_eq!(err.detail(), "IllegalState");
    }
}
