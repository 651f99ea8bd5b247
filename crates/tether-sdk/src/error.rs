//! Error types for native members

/// Result type for native member calls
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors raised by native methods and field accessors.
///
/// The bridge forwards these to the client as invocation failures, keeping
/// `message()` and `detail()` intact.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NativeError {
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Invalid argument
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// Member invoked on a receiver of the wrong type
    #[error("Receiver mismatch: expected instance of {expected}, got {got}")]
    WrongReceiver {
        /// Type the member belongs to
        expected: String,
        /// Type of the receiver actually passed
        got: String,
    },

    /// Write to a field without a setter
    #[error("Field '{0}' is read-only")]
    ReadOnlyField(String),

    /// Native code panicked
    #[error("Native call panicked: {0}")]
    Panic(String),

    /// Error raised by the native implementation itself
    #[error("{message}")]
    Raised {
        /// Human-readable message
        message: String,
        /// Additional detail (error class, trace, ...)
        detail: String,
    },
}

impl NativeError {
    /// Error raised by native code with a message and detail
    pub fn raised(message: impl Into<String>, detail: impl Into<String>) -> Self {
        NativeError::Raised {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            NativeError::Raised { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Detail string forwarded alongside the message
    pub fn detail(&self) -> String {
        match self {
            NativeError::TypeMismatch { .. } => "TypeMismatch".to_string(),
            NativeError::ArgumentError(_) => "ArgumentError".to_string(),
            NativeError::WrongReceiver { .. } => "WrongReceiver".to_string(),
            NativeError::ReadOnlyField(_) => "ReadOnlyField".to_string(),
            NativeError::Panic(_) => "Panic".to_string(),
            NativeError::Raised { detail, .. } => detail.clone(),
        }
    }
}

impl From<String> for NativeError {
    fn from(s: String) -> Self {
        NativeError::raised(s, "")
    }
}

impl From<&str> for NativeError {
    fn from(s: &str) -> Self {
        NativeError::raised(s, "")
    }
}
