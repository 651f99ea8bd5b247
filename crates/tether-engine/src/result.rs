//! Call results
//!
//! Every public operation ends in exactly one `CallResult`, which is handed
//! to the transport through a [`ResultSink`]. Delivering consumes the
//! result, so it cannot be reported twice.

use tether_sdk::Value;

use crate::error::BridgeError;

/// Receives the outcome of one request
pub trait ResultSink {
    /// The operation succeeded with `value`
    fn success(&mut self, value: Value);

    /// The operation failed
    fn error(&mut self, message: &str, detail: &str);

    /// No operation matches the request's method name and arity
    fn not_implemented(&mut self);
}

/// Outcome of an operation
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Operation completed (`Null` for operations without a value)
    Success(Value),
    /// Operation failed
    Failure {
        /// Human-readable message
        message: String,
        /// Error code or native detail
        detail: String,
    },
}

impl CallResult {
    /// Success without a value
    pub fn empty() -> Self {
        CallResult::Success(Value::Null)
    }

    /// Failure with a message and detail
    pub fn failure(message: impl Into<String>, detail: impl Into<String>) -> Self {
        CallResult::Failure {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success(_))
    }

    /// Success value, if any
    pub fn value(&self) -> Option<&Value> {
        match self {
            CallResult::Success(value) => Some(value),
            CallResult::Failure { .. } => None,
        }
    }

    /// Failure detail, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            CallResult::Success(_) => None,
            CallResult::Failure { detail, .. } => Some(detail),
        }
    }

    /// Hand the result to a sink
    pub fn deliver(self, sink: &mut dyn ResultSink) {
        match self {
            CallResult::Success(value) => sink.success(value),
            CallResult::Failure { message, detail } => sink.error(&message, &detail),
        }
    }
}

impl From<BridgeError> for CallResult {
    fn from(err: BridgeError) -> Self {
        CallResult::Failure {
            message: err.message(),
            detail: err.detail(),
        }
    }
}

impl From<Result<Value, BridgeError>> for CallResult {
    fn from(result: Result<Value, BridgeError>) -> Self {
        match result {
            Ok(value) => CallResult::Success(value),
            Err(err) => err.into(),
        }
    }
}

/// What an operation hands back: a finished result, or a plain value that
/// still needs wrapping
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Already wrapped
    Result(CallResult),
    /// Plain value, reported as success
    Value(Value),
}

impl Reply {
    /// Wrap into a `CallResult`
    pub fn into_result(self) -> CallResult {
        match self {
            Reply::Result(result) => result,
            Reply::Value(value) => CallResult::Success(value),
        }
    }
}

impl From<CallResult> for Reply {
    fn from(result: CallResult) -> Self {
        Reply::Result(result)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

/// Sink that records what it receives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectingSink {
    /// Last outcome reported, if any
    pub outcome: Option<Outcome>,
}

/// Outcome recorded by [`CollectingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `success` was called
    Success(Value),
    /// `error` was called
    Error {
        /// Reported message
        message: String,
        /// Reported detail
        detail: String,
    },
    /// `not_implemented` was called
    NotImplemented,
}

impl ResultSink for CollectingSink {
    fn success(&mut self, value: Value) {
        self.outcome = Some(Outcome::Success(value));
    }

    fn error(&mut self, message: &str, detail: &str) {
        self.outcome = Some(Outcome::Error {
            message: message.to_string(),
            detail: detail.to_string(),
        });
    }

    fn not_implemented(&mut self) {
        self.outcome = Some(Outcome::NotImplemented);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_success() {
        let mut sink = CollectingSink::default();
        CallResult::Success(Value::Int(42)).deliver(&mut sink);
        assert_eq!(sink.outcome, Some(Outcome::Success(Value::Int(42))));
    }

    #[test]
    fn test_deliver_failure() {
        let mut sink = CollectingSink::default();
        CallResult::from(BridgeError::TargetNotFound("x".into())).deliver(&mut sink);
        match sink.outcome {
            Some(Outcome::Error { message, detail }) => {
                assert!(message.contains("x"));
                assert_eq!(detail, "TargetNotFound");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_reply_wraps_plain_values() {
        assert_eq!(Reply::from(Value::Int(1)).into_result(), CallResult::Success(Value::Int(1)));
        let failure = CallResult::failure("m", "d");
        assert_eq!(Reply::from(failure.clone()).into_result(), failure);
    }
}
