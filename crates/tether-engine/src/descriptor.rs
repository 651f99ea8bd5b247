//! Call descriptors
//!
//! A descriptor is one step of a remote call: "the global `Registrar`",
//! "the type `host.Math`", "method `add/1` on my parent", "field `count` on
//! my parent". Chaining descriptors through `parent` expresses a whole call
//! path such as `Registrar.counter().add(41)`.
//!
//! ## Wire format
//!
//! On the wire a descriptor is a map:
//!
//! | Key  | Meaning                                   |
//! |------|-------------------------------------------|
//! | `n`  | member or root name (non-empty string)    |
//! | `id` | correlation id (string, optional)         |
//! | `t`  | kind index (see [`TargetKind`])           |
//! | `a`  | arguments: absent/null, one value, a list |
//! | `p`  | parent descriptor (same shape, optional)  |
//!
//! Decoding only checks shape. Whether names resolve is decided later by the
//! engine.

use std::collections::BTreeMap;
use std::fmt;

use tether_sdk::Value;

use crate::error::{BridgeError, BridgeResult};

/// Longest parent chain accepted from the wire
pub const MAX_DEPTH: usize = 128;

/// What a descriptor refers to.
///
/// The wire indices are fixed and shared with clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A global instance from the root registry (index 0)
    Global,
    /// A type from the type registry (index 1)
    Type,
    /// A method on the parent target (index 2)
    Method,
    /// Reserved; always rejected during resolution (index 3)
    Invalid,
    /// A field on the parent target (index 4)
    Field,
}

impl TargetKind {
    /// Kind for a wire index
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(TargetKind::Global),
            1 => Some(TargetKind::Type),
            2 => Some(TargetKind::Method),
            3 => Some(TargetKind::Invalid),
            4 => Some(TargetKind::Field),
            _ => None,
        }
    }

    /// Wire index
    pub fn index(self) -> i64 {
        match self {
            TargetKind::Global => 0,
            TargetKind::Type => 1,
            TargetKind::Method => 2,
            TargetKind::Invalid => 3,
            TargetKind::Field => 4,
        }
    }

    /// Whether the kind may appear without a parent
    pub fn is_root(self) -> bool {
        matches!(self, TargetKind::Global | TargetKind::Type)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetKind::Global => "GLOBAL",
            TargetKind::Type => "TYPE",
            TargetKind::Method => "METHOD",
            TargetKind::Invalid => "INVALID",
            TargetKind::Field => "FIELD",
        };
        f.write_str(name)
    }
}

/// Call arguments attached to a descriptor
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Arguments {
    /// No arguments (arity 0)
    #[default]
    Absent,
    /// One argument (arity 1)
    Single(Value),
    /// Positional arguments (arity = length)
    List(Vec<Value>),
}

impl Arguments {
    /// Interpret a raw argument value: null is absent, a list is spread
    /// positionally, anything else is a single argument
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Arguments::Absent,
            Value::List(items) => Arguments::List(items),
            other => Arguments::Single(other),
        }
    }

    /// Number of positional arguments
    pub fn arity(&self) -> usize {
        match self {
            Arguments::Absent => 0,
            Arguments::Single(_) => 1,
            Arguments::List(items) => items.len(),
        }
    }

    /// Check if no arguments were given
    pub fn is_absent(&self) -> bool {
        matches!(self, Arguments::Absent)
    }

    /// Arguments as a positional slice
    pub fn as_slice(&self) -> &[Value] {
        match self {
            Arguments::Absent => &[],
            Arguments::Single(value) => std::slice::from_ref(value),
            Arguments::List(items) => items,
        }
    }

    /// Value assigned by a field write: the single value, or the whole list
    pub fn into_assigned(self) -> Value {
        match self {
            Arguments::Absent => Value::Null,
            Arguments::Single(value) => value,
            Arguments::List(items) => Value::List(items),
        }
    }

    fn to_wire(&self) -> Option<Value> {
        match self {
            Arguments::Absent => None,
            Arguments::Single(value) => Some(value.clone()),
            Arguments::List(items) => Some(Value::List(items.clone())),
        }
    }
}

/// One node of a call path
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Member or root name
    pub name: String,
    /// What the name refers to
    pub kind: TargetKind,
    /// Cache key
    pub correlation_id: Option<String>,
    /// Call arguments or assigned field value
    pub arguments: Arguments,
    /// Target the member is looked up on
    pub parent: Option<Box<Descriptor>>,
}

impl Descriptor {
    /// Descriptor with no id, arguments or parent
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            correlation_id: None,
            arguments: Arguments::Absent,
            parent: None,
        }
    }

    /// Root descriptor for a global instance
    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Global)
    }

    /// Root descriptor for a registered type
    pub fn type_ref(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Type)
    }

    /// Method call on `parent`
    pub fn method(parent: Descriptor, name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Method).with_parent(parent)
    }

    /// Field access on `parent`
    pub fn field(parent: Descriptor, name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Field).with_parent(parent)
    }

    /// Set the correlation id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: Descriptor) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Set positional arguments
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.arguments = Arguments::List(args);
        self
    }

    /// Set a single argument (or the value assigned to a field)
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.arguments = Arguments::Single(value.into());
        self
    }

    /// Number of positional arguments
    pub fn arity(&self) -> usize {
        self.arguments.arity()
    }

    /// Depth of the parent chain (a root has depth 0)
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_deref();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent.as_deref();
        }
        depth
    }

    /// Decode a descriptor from its wire map
    pub fn from_value(value: &Value) -> BridgeResult<Self> {
        Self::decode(value, 0)
    }

    fn decode(value: &Value, depth: usize) -> BridgeResult<Self> {
        if depth > MAX_DEPTH {
            return Err(BridgeError::Validation(format!(
                "descriptor chain is deeper than {}",
                MAX_DEPTH
            )));
        }
        let map = value.as_map().ok_or_else(|| {
            BridgeError::Validation(format!("descriptor must be a map, got {}", value.type_name()))
        })?;

        let name = match map.get("n") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(Value::String(_)) => {
                return Err(BridgeError::Validation("descriptor name is empty".to_string()))
            }
            Some(other) => {
                return Err(BridgeError::Validation(format!(
                    "descriptor name must be a string, got {}",
                    other.type_name()
                )))
            }
            None => return Err(BridgeError::Validation("descriptor name is missing".to_string())),
        };

        let kind = match map.get("t") {
            Some(Value::Int(index)) => TargetKind::from_index(*index).ok_or_else(|| {
                BridgeError::Validation(format!("unknown descriptor kind {} for '{}'", index, name))
            })?,
            Some(other) => {
                return Err(BridgeError::Validation(format!(
                    "descriptor kind must be an int, got {}",
                    other.type_name()
                )))
            }
            None => {
                return Err(BridgeError::Validation(format!(
                    "descriptor kind is missing for '{}'",
                    name
                )))
            }
        };

        let correlation_id = match map.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(other) => {
                return Err(BridgeError::Validation(format!(
                    "correlation id must be a string, got {}",
                    other.type_name()
                )))
            }
        };

        let arguments = map
            .get("a")
            .cloned()
            .map(Arguments::from_value)
            .unwrap_or_default();

        let parent = match map.get("p") {
            None | Some(Value::Null) => None,
            Some(parent @ Value::Map(_)) => Some(Box::new(Self::decode(parent, depth + 1)?)),
            Some(other) => {
                return Err(BridgeError::Validation(format!(
                    "parent must be a map, got {}",
                    other.type_name()
                )))
            }
        };

        Ok(Self {
            name,
            kind,
            correlation_id,
            arguments,
            parent,
        })
    }

    /// Decode a descriptor from JSON
    pub fn from_json(json: serde_json::Value) -> BridgeResult<Self> {
        let value = Value::try_from(json)
            .map_err(|e| BridgeError::Validation(format!("invalid argument: {}", e.message())))?;
        Self::from_value(&value)
    }

    /// Encode to the wire map
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), Value::from(self.name.as_str()));
        map.insert("t".to_string(), Value::Int(self.kind.index()));
        if let Some(id) = &self.correlation_id {
            map.insert("id".to_string(), Value::from(id.as_str()));
        }
        if let Some(args) = self.arguments.to_wire() {
            map.insert("a".to_string(), args);
        }
        if let Some(parent) = &self.parent {
            map.insert("p".to_string(), parent.to_value());
        }
        Value::Map(map)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{}.", parent)?;
        }
        match self.kind {
            TargetKind::Method => write!(f, "{}/{}", self.name, self.arity()),
            _ => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_chain() {
        let desc = Descriptor::from_json(json!({
            "n": "add",
            "t": 2,
            "id": "c1",
            "a": [1, 2],
            "p": { "n": "host.Math", "t": 1 }
        }))
        .unwrap();

        assert_eq!(desc.name, "add");
        assert_eq!(desc.kind, TargetKind::Method);
        assert_eq!(desc.correlation_id.as_deref(), Some("c1"));
        assert_eq!(desc.arity(), 2);
        let parent = desc.parent.as_deref().unwrap();
        assert_eq!(parent.kind, TargetKind::Type);
        assert_eq!(parent.name, "host.Math");
        assert_eq!(desc.depth(), 1);
        assert_eq!(desc.to_string(), "host.Math.add/2");
    }

    #[test]
    fn test_arguments_shapes() {
        let single = Descriptor::from_json(json!({"n": "f", "t": 2, "a": 41})).unwrap();
        assert_eq!(single.arguments, Arguments::Single(Value::Int(41)));
        assert_eq!(single.arity(), 1);

        let null = Descriptor::from_json(json!({"n": "f", "t": 2, "a": null})).unwrap();
        assert!(null.arguments.is_absent());
        assert_eq!(null.arity(), 0);

        let empty = Descriptor::from_json(json!({"n": "f", "t": 2, "a": []})).unwrap();
        assert_eq!(empty.arguments, Arguments::List(vec![]));
        assert_eq!(empty.arity(), 0);
    }

    #[test]
    fn test_kind_indices() {
        for kind in [
            TargetKind::Global,
            TargetKind::Type,
            TargetKind::Method,
            TargetKind::Invalid,
            TargetKind::Field,
        ] {
            assert_eq!(TargetKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(TargetKind::from_index(5), None);
        assert!(TargetKind::Global.is_root());
        assert!(!TargetKind::Field.is_root());
    }

    #[test]
    fn test_invalid_kind_index_decodes() {
        let desc = Descriptor::from_json(json!({"n": "x", "t": 3})).unwrap();
        assert_eq!(desc.kind, TargetKind::Invalid);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            json!("not a map"),
            json!({"t": 0}),
            json!({"n": "", "t": 0}),
            json!({"n": 5, "t": 0}),
            json!({"n": "x"}),
            json!({"n": "x", "t": "0"}),
            json!({"n": "x", "t": 9}),
            json!({"n": "x", "t": 0, "id": 3}),
            json!({"n": "x", "t": 2, "p": [1]}),
            json!({"n": "x", "t": 2, "p": {"t": 0}}),
            json!({"n": "x", "t": 2, "a": 18446744073709551615u64}),
        ];
        for case in cases {
            let err = Descriptor::from_json(case.clone()).unwrap_err();
            assert_eq!(err.code(), "ValidationError", "case {}", case);
        }
    }

    #[test]
    fn test_encode_matches_decode() {
        let desc = Descriptor::method(Descriptor::global("Registrar"), "counter")
            .with_id("c")
            .with_value(3i64);
        let decoded = Descriptor::from_value(&desc.to_value()).unwrap();
        assert_eq!(decoded, desc);
    }

    #[test]
    fn test_depth_limit() {
        let mut desc = Descriptor::global("Registrar");
        for i in 0..=MAX_DEPTH {
            desc = Descriptor::field(desc, format!("f{}", i));
        }
        let err = Descriptor::from_value(&desc.to_value()).unwrap_err();
        assert!(err.message().contains("deeper than"));
    }

    #[test]
    fn test_field_assignment_value() {
        assert_eq!(Arguments::Single(Value::Int(7)).into_assigned(), Value::Int(7));
        assert_eq!(
            Arguments::List(vec![Value::Int(1)]).into_assigned(),
            Value::List(vec![Value::Int(1)])
        );
    }
}
