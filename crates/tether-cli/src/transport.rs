//! JSON-lines transport
//!
//! One request per line on the input, one response per line on the output:
//!
//! ```text
//! -> {"method": "invoke", "arguments": {"n": "inc", "t": 2, "a": 41, "p": {"n": "host.Math", "t": 1}}}
//! <- {"ok": 42}
//! -> {"method": "dispose", "arguments": "c1"}
//! <- {"ok": null}
//! -> {"method": "reflect"}
//! <- {"notImplemented": true}
//! ```
//!
//! Failures are reported as `{"error": {"message": ..., "detail": ...}}`.
//! A line that is not a valid request gets an error response; the loop
//! keeps going.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use tether_engine::{Dispatcher, MethodCall, ResultSink};
use tether_sdk::Value;
use tracing::{debug, info};

/// Incoming request line
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Operation name
    pub method: String,
    /// Operation arguments
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

/// Failure payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub message: String,
    /// Error code or native detail
    pub detail: String,
}

/// Outgoing response line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `{"ok": value}`
    Ok {
        /// Result value
        ok: Value,
    },
    /// `{"error": {...}}`
    Error {
        /// Failure payload
        error: ErrorBody,
    },
    /// `{"notImplemented": true}`
    NotImplemented {
        /// Always `true`
        #[serde(rename = "notImplemented")]
        not_implemented: bool,
    },
}

impl Response {
    fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Response::Error {
            error: ErrorBody {
                message: message.into(),
                detail: detail.into(),
            },
        }
    }
}

/// Sink capturing the dispatcher's outcome as a response
#[derive(Debug, Default)]
struct ResponseSink {
    response: Option<Response>,
}

impl ResultSink for ResponseSink {
    fn success(&mut self, value: Value) {
        self.response = Some(Response::Ok { ok: value });
    }

    fn error(&mut self, message: &str, detail: &str) {
        self.response = Some(Response::error(message, detail));
    }

    fn not_implemented(&mut self) {
        self.response = Some(Response::NotImplemented {
            not_implemented: true,
        });
    }
}

/// Handle one parsed request
pub fn handle_request(dispatcher: &Dispatcher, request: Request) -> Response {
    let arguments = match request.arguments.map(Value::try_from).transpose() {
        Ok(arguments) => arguments,
        Err(err) => return Response::error(err.message(), "ValidationError"),
    };

    let mut sink = ResponseSink::default();
    dispatcher.handle(MethodCall::new(request.method, arguments), &mut sink);
    sink.response
        .unwrap_or_else(|| Response::error("no outcome reported", "InternalError"))
}

/// Handle one raw request line
pub fn handle_line(dispatcher: &Dispatcher, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle_request(dispatcher, request),
        Err(err) => Response::error(format!("malformed request: {}", err), "ValidationError"),
    }
}

/// Serve requests from `input` until end of input. Returns the number of
/// requests handled.
pub fn serve<R: BufRead, W: Write>(
    dispatcher: &Dispatcher,
    input: R,
    mut output: W,
) -> io::Result<usize> {
    info!("serving requests");
    let mut handled = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(dispatcher, &line);
        debug!(?response, "response");
        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
        handled += 1;
    }
    info!(handled, "input closed");
    Ok(handled)
}
