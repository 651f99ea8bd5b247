//! Type and root registries
//!
//! Both registries are populated once through a builder at startup and are
//! read-only afterwards, so they can be shared between threads behind an
//! `Arc` without locking.
//!
//! The type registry stands in for runtime reflection: every native type the
//! bridge can reach is described by a `TypeDescriptor` registered here under
//! its fully-qualified name.

use rustc_hash::{FxHashMap, FxHashSet};
use tether_sdk::{TypeDescriptor, TypeHandle, Value};

/// Errors raised while building a registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two types registered under the same name
    #[error("Type '{0}' is registered twice")]
    DuplicateType(String),

    /// A superclass or enclosing reference names an unregistered type
    #[error("Type '{owner}' references unknown type '{referenced}'")]
    UnknownType {
        /// Type holding the reference
        owner: String,
        /// Name that could not be found
        referenced: String,
    },

    /// A superclass or enclosing chain loops back on itself
    #[error("Type '{0}' is part of a {1} cycle")]
    Cycle(String, &'static str),

    /// Two globals registered under the same name
    #[error("Global '{0}' is registered twice")]
    DuplicateRoot(String),

    /// Empty type or global name
    #[error("Registered names cannot be empty")]
    EmptyName,
}

// ============================================================================
// TypeRegistry
// ============================================================================

/// Registry of native types, keyed by fully-qualified name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Start building a registry
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Handle for a registered type
    pub fn handle(&self, name: &str) -> Option<TypeHandle> {
        self.types.get(name).map(TypeDescriptor::handle)
    }

    /// Check if a type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Name of the type whose members apply to `value`.
    ///
    /// A type handle names its own type (static access); objects report the
    /// type they were created with; plain data maps to a primitive name such
    /// as `int` or `string`, so a host may register members on primitives.
    pub fn type_name_of(value: &Value) -> &str {
        match value {
            Value::Type(handle) => handle.name(),
            other => other.type_name(),
        }
    }
}

/// Builder for [`TypeRegistry`]
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    types: Vec<TypeDescriptor>,
}

impl TypeRegistryBuilder {
    /// Register a type
    pub fn register(mut self, desc: TypeDescriptor) -> Self {
        self.types.push(desc);
        self
    }

    /// Validate names and references and freeze the registry
    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        let mut types = FxHashMap::default();
        for desc in self.types {
            if desc.name().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if types.contains_key(desc.name()) {
                return Err(RegistryError::DuplicateType(desc.name().to_string()));
            }
            types.insert(desc.name().to_string(), desc);
        }

        for desc in types.values() {
            for referenced in [desc.superclass(), desc.enclosing()].into_iter().flatten() {
                if !types.contains_key(referenced) {
                    return Err(RegistryError::UnknownType {
                        owner: desc.name().to_string(),
                        referenced: referenced.to_string(),
                    });
                }
            }
        }

        for name in types.keys() {
            check_chain(&types, name, "superclass", TypeDescriptor::superclass)?;
            check_chain(&types, name, "enclosing", TypeDescriptor::enclosing)?;
        }

        Ok(TypeRegistry { types })
    }
}

fn check_chain(
    types: &FxHashMap<String, TypeDescriptor>,
    start: &str,
    what: &'static str,
    next: fn(&TypeDescriptor) -> Option<&str>,
) -> Result<(), RegistryError> {
    let mut seen = FxHashSet::default();
    let mut current = Some(start);
    while let Some(name) = current {
        if !seen.insert(name) {
            return Err(RegistryError::Cycle(start.to_string(), what));
        }
        current = types.get(name).and_then(next);
    }
    Ok(())
}

// ============================================================================
// RootRegistry
// ============================================================================

/// Registry of global instances reachable from root descriptors
#[derive(Debug, Default)]
pub struct RootRegistry {
    roots: FxHashMap<String, Value>,
}

impl RootRegistry {
    /// Start building a registry
    pub fn builder() -> RootRegistryBuilder {
        RootRegistryBuilder::default()
    }

    /// Look up a global by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.roots.get(name)
    }

    /// Registered global names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of globals
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Builder for [`RootRegistry`]
#[derive(Debug, Default)]
pub struct RootRegistryBuilder {
    roots: Vec<(String, Value)>,
}

impl RootRegistryBuilder {
    /// Register a global instance
    pub fn insert(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.roots.push((name.into(), value.into()));
        self
    }

    /// Validate names and freeze the registry
    pub fn build(self) -> Result<RootRegistry, RegistryError> {
        let mut roots = FxHashMap::default();
        for (name, value) in self.roots {
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if roots.contains_key(&name) {
                return Err(RegistryError::DuplicateRoot(name));
            }
            roots.insert(name, value);
        }
        Ok(RootRegistry { roots })
    }
}
