//! Demo host types
//!
//! The types a host process publishes to the bridge. A real host registers
//! its own; these give `tether serve` something to resolve against.
//!
//! | Type                    | Members                                          |
//! |-------------------------|--------------------------------------------------|
//! | `host.Registrar`        | `channel()`, `counter(initial)`                  |
//! | `host.Counter`          | `add(n)`, `get()`, `snapshot()`, `value`, `reset()` (private), `create(initial)` (static), `MAX` (static) |
//! | `host.Counter.Snapshot` | `value` (read-only), nested in `host.Counter`    |
//! | `host.Math`             | `add(a, b)`, `inc(x)`, `PI`, `calls` (static)    |

use std::sync::Arc;

use parking_lot::Mutex;
use tether_engine::{
    BridgeConfig, Dispatcher, Engine, RegistryError, RootRegistry, TypeRegistry,
};
use tether_sdk::{
    arg, FieldEntry, FromValue, MethodEntry, NativeError, ObjectRef, TypeDescriptor, Value,
};

/// Counter state behind `host.Counter`
#[derive(Debug, Default)]
pub struct Counter {
    value: Mutex<i64>,
}

impl Counter {
    /// Counter starting at `initial`
    pub fn new(initial: i64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    fn object(initial: i64) -> Value {
        Value::Object(ObjectRef::new("host.Counter", Counter::new(initial)))
    }
}

/// Frozen copy of a counter's value
#[derive(Debug)]
pub struct Snapshot {
    value: i64,
}

/// State behind the `Registrar` global
#[derive(Debug)]
pub struct Registrar {
    channel: String,
}

/// Largest value a counter may hold
pub const COUNTER_MAX: i64 = 1_000_000;

fn add_checked(counter: &Counter, n: i64) -> Result<Value, NativeError> {
    let mut value = counter.value.lock();
    let next = value
        .checked_add(n)
        .filter(|v| *v <= COUNTER_MAX)
        .ok_or_else(|| NativeError::raised(format!("counter would exceed {}", COUNTER_MAX), "Overflow"))?;
    *value = next;
    Ok(Value::Int(next))
}

/// Register the demo types
pub fn types() -> Result<TypeRegistry, RegistryError> {
    TypeRegistry::builder()
        .register(
            TypeDescriptor::new("host.Registrar")
                .method(MethodEntry::instance::<Registrar>("channel", 0, |r, _| {
                    Ok(Value::from(r.channel.as_str()))
                }))
                .method(MethodEntry::instance::<Registrar>("counter", 1, |_, args| {
                    Ok(Counter::object(arg(args, 0)?))
                })),
        )
        .register(
            TypeDescriptor::new("host.Counter")
                .method(MethodEntry::instance::<Counter>("add", 1, |c, args| {
                    add_checked(c, arg(args, 0)?)
                }))
                .method(MethodEntry::instance::<Counter>("get", 0, |c, _| {
                    Ok(Value::Int(*c.value.lock()))
                }))
                .method(MethodEntry::instance::<Counter>("snapshot", 0, |c, _| {
                    let value = *c.value.lock();
                    Ok(Value::Object(ObjectRef::new("host.Counter.Snapshot", Snapshot { value })))
                }))
                .method(
                    MethodEntry::instance::<Counter>("reset", 0, |c, _| {
                        *c.value.lock() = 0;
                        Ok(Value::Null)
                    })
                    .private(),
                )
                .method(MethodEntry::static_fn("create", 1, |args| {
                    Ok(Counter::object(arg(args, 0)?))
                }))
                .field(FieldEntry::instance::<Counter>(
                    "value",
                    |c| Value::Int(*c.value.lock()),
                    |c, v| {
                        *c.value.lock() = i64::from_value(&v)?;
                        Ok(())
                    },
                ))
                .field(FieldEntry::constant("MAX", Value::Int(COUNTER_MAX))),
        )
        .register(
            TypeDescriptor::new("host.Counter.Snapshot")
                .enclosed_in("host.Counter")
                .field(FieldEntry::instance_readonly::<Snapshot>("value", |s| Value::Int(s.value))),
        )
        .register(
            TypeDescriptor::new("host.Math")
                .method(MethodEntry::static_fn("add", 2, |args| {
                    let a: Value = arg(args, 0)?;
                    let b: Value = arg(args, 1)?;
                    if let (Value::Int(x), Value::Int(y)) = (&a, &b) {
                        if let Some(sum) = x.checked_add(*y) {
                            return Ok(Value::Int(sum));
                        }
                    }
                    Ok(Value::Float(f64::from_value(&a)? + f64::from_value(&b)?))
                }))
                .method(MethodEntry::static_fn("inc", 1, |args| {
                    let x: i64 = arg(args, 0)?;
                    Ok(Value::Int(x.wrapping_add(1)))
                }))
                .field(FieldEntry::constant("PI", Value::Float(std::f64::consts::PI)))
                .field(FieldEntry::stored("calls", Value::Int(0))),
        )
        .build()
}

/// Register the globals, publishing the registrar under the configured name
pub fn roots(config: &BridgeConfig) -> Result<RootRegistry, RegistryError> {
    let registrar = Registrar {
        channel: config.bridge.channel.clone(),
    };
    RootRegistry::builder()
        .insert(
            config.bridge.registrar.as_str(),
            ObjectRef::new("host.Registrar", registrar),
        )
        .build()
}

/// Build a dispatcher over the demo host
pub fn dispatcher(config: &BridgeConfig) -> anyhow::Result<Dispatcher> {
    let engine = Engine::new(Arc::new(types()?), Arc::new(roots(config)?))
        .with_policy(config.access_policy()?);
    Ok(Dispatcher::new(engine))
}
