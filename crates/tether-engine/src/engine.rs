//! Target resolution
//!
//! Walks a descriptor's parent chain from the root down, turning each node
//! into a live target:
//!
//! ```text
//! resolve(d):
//!   empty name                -> ValidationError
//!   d.id cached               -> cached target (parent never evaluated)
//!   no parent                 -> root registry / type registry
//!   parent                    -> resolve(parent), then method call or
//!                                field read/write on that target
//! ```
//!
//! Native members are called with the parent target as receiver. A type
//! handle receiver means static access. Errors and panics raised by native
//! code surface as `InvocationFailure`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tether_sdk::{NativeError, NativeResult, Value};
use tracing::debug;

use crate::access::{Access, AccessPolicy};
use crate::cache::TargetCache;
use crate::descriptor::{Descriptor, TargetKind};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::{RootRegistry, TypeRegistry};
use crate::resolver::MemberResolver;

/// Resolves descriptors against registries and the target cache
#[derive(Debug, Clone)]
pub struct Engine {
    types: Arc<TypeRegistry>,
    roots: Arc<RootRegistry>,
    cache: Arc<TargetCache>,
    policy: Arc<AccessPolicy>,
}

impl Engine {
    /// Engine with an empty cache and a policy that allows everything
    pub fn new(types: Arc<TypeRegistry>, roots: Arc<RootRegistry>) -> Self {
        Self {
            types,
            roots,
            cache: Arc::new(TargetCache::new()),
            policy: Arc::new(AccessPolicy::allow_all()),
        }
    }

    /// Share an existing cache
    pub fn with_cache(mut self, cache: Arc<TargetCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the access policy
    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Type registry
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Root registry
    pub fn roots(&self) -> &RootRegistry {
        &self.roots
    }

    /// Target cache
    pub fn cache(&self) -> &Arc<TargetCache> {
        &self.cache
    }

    /// Access policy
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Resolve a descriptor to its target
    pub fn resolve(&self, desc: &Descriptor) -> BridgeResult<Value> {
        if desc.name.is_empty() {
            return Err(BridgeError::Validation("descriptor name is empty".to_string()));
        }

        if let Some(id) = &desc.correlation_id {
            if let Some(cached) = self.cache.get(id) {
                debug!(id = id.as_str(), name = desc.name.as_str(), "resolved from cache");
                return Ok(cached);
            }
        }

        match &desc.parent {
            None => self.resolve_root(desc),
            Some(parent) => {
                let target = self.resolve(parent)?;
                self.resolve_member(desc, target)
            }
        }
    }

    fn resolve_root(&self, desc: &Descriptor) -> BridgeResult<Value> {
        debug!(kind = %desc.kind, name = desc.name.as_str(), "resolving root");
        match desc.kind {
            TargetKind::Global => self.roots.get(&desc.name).cloned().ok_or_else(|| {
                BridgeError::TargetNotFound(format!("no global named '{}'", desc.name))
            }),
            TargetKind::Type => self.types.handle(&desc.name).map(Value::Type).ok_or_else(|| {
                BridgeError::TargetNotFound(format!("no type named '{}'", desc.name))
            }),
            kind => Err(BridgeError::UnsupportedRoot(format!(
                "{} '{}' cannot be resolved without a parent",
                kind, desc.name
            ))),
        }
    }

    fn resolve_member(&self, desc: &Descriptor, target: Value) -> BridgeResult<Value> {
        if target.is_null() {
            return Err(BridgeError::TargetNotFound(format!(
                "parent of '{}' resolved to null",
                desc.name
            )));
        }
        if !matches!(desc.kind, TargetKind::Method | TargetKind::Field) {
            return Err(BridgeError::UnsupportedOperation(format!(
                "{} '{}' cannot be applied to a parent target",
                desc.kind, desc.name
            )));
        }

        let type_name = TypeRegistry::type_name_of(&target);
        if !self.types.contains(type_name) {
            return Err(BridgeError::MemberNotFound(format!(
                "'{}' on unregistered type '{}'",
                desc.name, type_name
            )));
        }
        let resolver = MemberResolver::new(&self.types);

        if desc.kind == TargetKind::Method {
            let arity = desc.arity();
            let found = resolver
                .find_method(type_name, &desc.name, arity)
                .ok_or_else(|| {
                    BridgeError::MemberNotFound(format!(
                        "method '{}' taking {} argument(s) on '{}'",
                        desc.name, arity, type_name
                    ))
                })?;
            let method = found.member;
            self.policy
                .check(found.declaring_type, &desc.name, method.visibility(), Access::Invoke)?;

            debug!(ty = type_name, method = desc.name.as_str(), arity, "invoking method");
            return guarded(|| method.invoke(&target, desc.arguments.as_slice()));
        }

        let found = resolver.find_field(type_name, &desc.name).ok_or_else(|| {
            BridgeError::MemberNotFound(format!("field '{}' on '{}'", desc.name, type_name))
        })?;
        let field = found.member;

        if desc.arguments.is_absent() {
            self.policy
                .check(found.declaring_type, &desc.name, field.visibility(), Access::Read)?;
            debug!(ty = type_name, field = desc.name.as_str(), "reading field");
            guarded(|| field.read(&target))
        } else {
            self.policy
                .check(found.declaring_type, &desc.name, field.visibility(), Access::Write)?;
            debug!(ty = type_name, field = desc.name.as_str(), "writing field");
            let value = desc.arguments.clone().into_assigned();
            guarded(|| field.write(&target, value)).map(|()| Value::Null)
        }
    }
}

/// Run native code, turning both its errors and its panics into
/// `InvocationFailure`
fn guarded<T>(f: impl FnOnce() -> NativeResult<T>) -> BridgeResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(BridgeError::from),
        Err(payload) => Err(NativeError::Panic(panic_message(payload.as_ref())).into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
