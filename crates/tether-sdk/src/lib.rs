//! Tether SDK - Lightweight SDK for declaring native types
//!
//! This crate provides the minimal types a host needs to expose native types
//! to a Tether bridge without depending on the full tether-engine.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use tether_sdk::{arg, MethodEntry, TypeDescriptor, Value};
//!
//! struct Counter(AtomicI64);
//!
//! let desc = TypeDescriptor::new("host.Counter")
//!     .method(MethodEntry::instance::<Counter>("add", 1, |c, args| {
//!         let n: i64 = arg(args, 0)?;
//!         Ok(Value::Int(c.0.fetch_add(n, Ordering::SeqCst) + n))
//!     }));
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod types;
pub mod value;

pub use convert::{arg, FromValue, ToValue};
pub use error::{NativeError, NativeResult};
pub use types::{
    FieldEntry, FieldGetFn, FieldSetFn, MethodEntry, MethodFn, TypeDescriptor, Visibility,
};
pub use value::{ObjectRef, TypeHandle, Value};
