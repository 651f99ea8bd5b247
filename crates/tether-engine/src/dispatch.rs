//! Request dispatch
//!
//! Entry point for the transport. A request names an operation and carries
//! its arguments; the dispatcher picks the operation by name and arity
//! (using the same matching as member resolution), runs it, and reports
//! exactly one outcome to the sink.
//!
//! ## Operations
//!
//! | Name             | Args         | Effect                                    |
//! |------------------|--------------|-------------------------------------------|
//! | `invoke`         | descriptor   | resolve, return the target                |
//! | `keep`           | descriptor   | resolve and cache under the id, no value  |
//! | `invokeAndCache` | descriptor   | same as `keep`                            |
//! | `dispose`        | id (string)  | drop the cached target                    |

use tether_sdk::Value;
use tracing::{debug, warn};

use crate::descriptor::{Arguments, Descriptor};
use crate::engine::Engine;
use crate::error::BridgeError;
use crate::resolver::{find_member, Member};
use crate::result::{CallResult, Reply, ResultSink};

/// One incoming request
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Operation name
    pub method: String,
    /// Raw arguments (`None` or null means no arguments; a list is spread)
    pub arguments: Option<Value>,
}

impl MethodCall {
    /// Create a request
    pub fn new(method: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

struct Operation {
    name: &'static str,
    arity: usize,
    run: fn(&Dispatcher, &[Value]) -> Reply,
}

impl Member for Operation {
    fn member_name(&self) -> &str {
        self.name
    }

    fn member_arity(&self) -> Option<usize> {
        Some(self.arity)
    }
}

const OPERATIONS: &[Operation] = &[
    Operation {
        name: "invoke",
        arity: 1,
        run: |d, args| with_descriptor(&args[0], |desc| d.invoke(desc)),
    },
    Operation {
        name: "keep",
        arity: 1,
        run: |d, args| with_descriptor(&args[0], |desc| d.invoke_and_cache(desc)),
    },
    Operation {
        name: "invokeAndCache",
        arity: 1,
        run: |d, args| with_descriptor(&args[0], |desc| d.invoke_and_cache(desc)),
    },
    Operation {
        name: "dispose",
        arity: 1,
        run: |d, args| match args[0].as_str() {
            Some(id) => {
                d.dispose(id);
                Reply::Value(Value::Null)
            }
            None => Reply::Result(
                BridgeError::Validation(format!(
                    "dispose expects a string id, got {}",
                    args[0].type_name()
                ))
                .into(),
            ),
        },
    },
];

fn with_descriptor(raw: &Value, op: impl FnOnce(&Descriptor) -> CallResult) -> Reply {
    match Descriptor::from_value(raw) {
        Ok(desc) => Reply::Result(op(&desc)),
        Err(err) => Reply::Result(err.into()),
    }
}

/// Routes requests to the resolution engine
#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: Engine,
}

impl Dispatcher {
    /// Create a dispatcher over `engine`
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Underlying engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Resolve a descriptor and return its target. Never caches.
    pub fn invoke(&self, desc: &Descriptor) -> CallResult {
        self.engine.resolve(desc).into()
    }

    /// Resolve a descriptor and cache a non-null target under its
    /// correlation id. Returns an empty success.
    pub fn invoke_and_cache(&self, desc: &Descriptor) -> CallResult {
        let Some(id) = desc.correlation_id.as_deref() else {
            return BridgeError::Validation(format!(
                "'{}' cannot be cached without a correlation id",
                desc.name
            ))
            .into();
        };

        match self.engine.resolve(desc) {
            Ok(Value::Null) => {
                debug!(id, "target is null, nothing cached");
                CallResult::empty()
            }
            Ok(target) => {
                debug!(id, ty = target.type_name(), "caching target");
                self.engine.cache().put(id, target);
                CallResult::empty()
            }
            Err(err) => err.into(),
        }
    }

    /// Drop a cached target. Unknown ids are ignored.
    pub fn dispose(&self, id: &str) {
        if self.engine.cache().remove(id).is_some() {
            debug!(id, "disposed cached target");
        }
    }

    /// Run an operation by name. Returns `None` when no operation matches
    /// the name and argument count.
    pub fn call(&self, method: &str, arguments: Option<Value>) -> Option<CallResult> {
        let args = Arguments::from_value(arguments.unwrap_or_default());
        let op = find_member(OPERATIONS, method, Some(args.arity()))?;
        Some((op.run)(self, args.as_slice()).into_result())
    }

    /// Handle one request and report its outcome to `sink`
    pub fn handle(&self, call: MethodCall, sink: &mut dyn ResultSink) {
        match self.call(&call.method, call.arguments) {
            Some(result) => {
                if let CallResult::Failure { message, detail } = &result {
                    warn!(method = call.method.as_str(), %detail, "{}", message);
                }
                result.deliver(sink);
            }
            None => {
                warn!(method = call.method.as_str(), "no such operation");
                sink.not_implemented();
            }
        }
    }
}
