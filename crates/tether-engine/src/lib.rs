//! Tether Bridge Engine
//!
//! Resolves call descriptors sent by a client process into native type,
//! field and method accesses on the host:
//! - **Descriptors**: wire decode and in-code construction (`descriptor`)
//! - **Registries**: native types and global instances (`registry`)
//! - **Resolution**: member lookup and target resolution (`resolver`, `engine`)
//! - **Dispatch**: operation routing, caching and results (`dispatch`, `cache`, `result`)
//! - **Policy**: access rules and configuration (`access`, `config`)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_engine::{Descriptor, Dispatcher, Engine, RootRegistry, TypeRegistry};
//! use tether_sdk::{MethodEntry, TypeDescriptor, Value};
//!
//! let types = TypeRegistry::builder()
//!     .register(TypeDescriptor::new("host.Math").method(MethodEntry::static_fn(
//!         "inc", 1, |args| Ok(Value::Int(args[0].as_int().unwrap_or(0) + 1)),
//!     )))
//!     .build()?;
//! let roots = RootRegistry::builder().build()?;
//! let dispatcher = Dispatcher::new(Engine::new(Arc::new(types), Arc::new(roots)));
//!
//! let call = Descriptor::method(Descriptor::type_ref("host.Math"), "inc").with_value(41i64);
//! assert_eq!(dispatcher.invoke(&call).value(), Some(&Value::Int(42)));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod access;
pub mod cache;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod result;

pub use access::{Access, AccessFlags, AccessPolicy, TypeRule};
pub use cache::TargetCache;
pub use config::{BridgeConfig, ConfigError};
pub use descriptor::{Arguments, Descriptor, TargetKind};
pub use dispatch::{Dispatcher, MethodCall};
pub use engine::Engine;
pub use error::{BridgeError, BridgeResult};
pub use registry::{RegistryError, RootRegistry, TypeRegistry};
pub use resolver::{find_member, Member, MemberResolver, Resolved};
pub use result::{CallResult, CollectingSink, Outcome, Reply, ResultSink};
