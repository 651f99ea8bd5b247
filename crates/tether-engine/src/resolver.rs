//! Member resolution
//!
//! Finds the method or field a descriptor names on a registered type.
//!
//! ## Search order
//!
//! For a type `T`:
//!
//! 1. members declared on `T` itself, whatever their visibility
//! 2. public members inherited through `T`'s superclass chain
//! 3. if `T` is nested, the same search on its enclosing type
//!
//! Within each list the first member in declaration order whose name
//! matches (and, for methods, whose arity equals the argument count) wins.
//! Arity is the only discriminator; argument types are not considered.
//!
//! Visibility is never a reason to skip a declared member here. Whether it
//! may be used is the access policy's call.

use tether_sdk::{FieldEntry, MethodEntry, TypeDescriptor};
use tracing::trace;

use crate::registry::TypeRegistry;

/// Anything that can be looked up by name and, optionally, arity
pub trait Member {
    /// Name the member is looked up by
    fn member_name(&self) -> &str;

    /// Number of parameters, or `None` if arity does not apply
    fn member_arity(&self) -> Option<usize>;

    /// Whether the member is inherited by subtypes
    fn is_public(&self) -> bool {
        true
    }
}

impl Member for MethodEntry {
    fn member_name(&self) -> &str {
        self.name()
    }

    fn member_arity(&self) -> Option<usize> {
        Some(self.arity())
    }

    fn is_public(&self) -> bool {
        self.visibility().is_public()
    }
}

impl Member for FieldEntry {
    fn member_name(&self) -> &str {
        self.name()
    }

    fn member_arity(&self) -> Option<usize> {
        None
    }

    fn is_public(&self) -> bool {
        self.visibility().is_public()
    }
}

fn matches<M: Member>(member: &M, name: &str, arity: Option<usize>) -> bool {
    member.member_name() == name
        && match (arity, member.member_arity()) {
            (Some(wanted), Some(declared)) => wanted == declared,
            _ => true,
        }
}

/// First member in `members` matching `name` and `arity`
pub fn find_member<'a, M: Member>(members: &'a [M], name: &str, arity: Option<usize>) -> Option<&'a M> {
    members.iter().find(|m| matches(*m, name, arity))
}

fn find_public<'a, M: Member>(members: &'a [M], name: &str, arity: Option<usize>) -> Option<&'a M> {
    members
        .iter()
        .find(|m| m.is_public() && matches(*m, name, arity))
}

/// A member found by the resolver, with the type that declares it
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'r, M> {
    /// The member itself
    pub member: &'r M,
    /// Type declaring the member (may be a superclass or enclosing type)
    pub declaring_type: &'r str,
}

/// Looks members up in a type registry
#[derive(Debug, Clone, Copy)]
pub struct MemberResolver<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> MemberResolver<'r> {
    /// Create a resolver over `registry`
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Find a method by name and exact arity
    pub fn find_method(
        &self,
        type_name: &str,
        name: &str,
        arity: usize,
    ) -> Option<Resolved<'r, MethodEntry>> {
        self.search(type_name, name, Some(arity), TypeDescriptor::methods)
    }

    /// Find a field by name
    pub fn find_field(&self, type_name: &str, name: &str) -> Option<Resolved<'r, FieldEntry>> {
        self.search(type_name, name, None, TypeDescriptor::fields)
    }

    fn search<M: Member>(
        &self,
        type_name: &str,
        name: &str,
        arity: Option<usize>,
        members: fn(&TypeDescriptor) -> &[M],
    ) -> Option<Resolved<'r, M>> {
        let mut current = self.registry.get(type_name);
        while let Some(desc) = current {
            if let Some(member) = find_member(members(desc), name, arity) {
                return Some(Resolved {
                    member,
                    declaring_type: desc.name(),
                });
            }

            let mut ancestor = desc.superclass().and_then(|s| self.registry.get(s));
            while let Some(sup) = ancestor {
                if let Some(member) = find_public(members(sup), name, arity) {
                    trace!(member = name, from = sup.name(), "inherited member");
                    return Some(Resolved {
                        member,
                        declaring_type: sup.name(),
                    });
                }
                ancestor = sup.superclass().and_then(|s| self.registry.get(s));
            }

            current = desc.enclosing().and_then(|e| self.registry.get(e));
            if let Some(outer) = current {
                trace!(member = name, outer = outer.name(), "searching enclosing type");
            }
        }
        None
    }
}
