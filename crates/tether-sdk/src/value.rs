//! Value: the untyped value exchanged across the bridge
//!
//! Call arguments arriving from the client, field contents, return values
//! and the intermediate targets of a chained call are all `Value`s.
//!
//! # Variants
//!
//! ```text
//! Null, Bool, Int (i64), Float (f64), String   plain data, wire-representable
//! List, Map                                     containers, wire-representable
//! Object(ObjectRef)                             shared handle to a native instance
//! Type(TypeHandle)                              handle naming a registered type
//! ```
//!
//! Objects and type handles never come from the wire; they are produced by
//! the host (root registry, native calls) and only travel back to the
//! client as opaque markers.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::NativeError;

// ============================================================================
// TypeHandle
// ============================================================================

/// Handle naming a registered native type.
///
/// Two handles are equal when they name the same type, so resolving the
/// same type name twice yields equal handles.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(Arc<str>);

impl TypeHandle {
    /// Create a handle for a fully-qualified type name
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Fully-qualified type name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.0)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ObjectRef
// ============================================================================

/// Shared handle to a native instance.
///
/// The handle carries the name of the registered type the instance belongs
/// to; member lookups on the instance go through that type. Cloning the
/// handle shares the instance, so state changes made through one clone are
/// visible through all of them. Instances that expose writable fields keep
/// their state behind interior mutability.
#[derive(Clone)]
pub struct ObjectRef {
    type_name: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap a native value as an instance of `type_name`
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: T) -> Self {
        Self::from_arc(type_name, Arc::new(value))
    }

    /// Wrap an already shared native value
    pub fn from_arc<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: Arc<T>) -> Self {
        Self {
            type_name: type_name.into(),
            inner: value,
        }
    }

    /// Name of the registered type this instance belongs to
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the native value if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether both handles point at the same instance
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObjectRef({} @ {:p})",
            self.type_name,
            Arc::as_ptr(&self.inner) as *const ()
        )
    }
}

// ============================================================================
// Value
// ============================================================================

/// Untyped bridge value
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    /// Absent / void
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
    /// Native instance
    Object(ObjectRef),
    /// Registered type
    Type(TypeHandle),
}

impl Value {
    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as map
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get as native instance
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get as type handle
    pub fn as_type(&self) -> Option<&TypeHandle> {
        match self {
            Value::Type(handle) => Some(handle),
            _ => None,
        }
    }

    /// Name of the type whose members apply to this value.
    ///
    /// Plain values map to the primitive names `null`, `bool`, `int`,
    /// `float`, `string`, `list` and `map`; instances report their
    /// registered type; type handles report `type`.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(obj) => obj.type_name(),
            Value::Type(_) => "type",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(obj) => write!(f, "{:?}", obj),
            Value::Type(handle) => write!(f, "{:?}", handle),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<TypeHandle> for Value {
    fn from(handle: TypeHandle) -> Self {
        Value::Type(handle)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = NativeError;

    /// Interpret a JSON document as a bridge value.
    ///
    /// Fails for unsigned integers that do not fit in an `i64`.
    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    return Err(NativeError::ArgumentError(format!(
                        "integer {} does not fit in a signed 64-bit value",
                        u
                    )));
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(map) => {
                let mut out = BTreeMap::new();
                for (key, value) in map {
                    out.insert(key, Value::try_from(value)?);
                }
                Value::Map(out)
            }
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Object(obj) => {
                let mut marker = serializer.serialize_map(Some(1))?;
                marker.serialize_entry("$object", obj.type_name())?;
                marker.end()
            }
            Value::Type(handle) => {
                let mut marker = serializer.serialize_map(Some(1))?;
                marker.serialize_entry("$type", handle.name())?;
                marker.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Gauge(i64);

    #[test]
    fn test_type_handle_equality() {
        let a = TypeHandle::new("pkg.TypeName");
        let b = TypeHandle::new("pkg.TypeName".to_string());
        assert_eq!(a, b);
        assert_eq!(a.name(), "pkg.TypeName");
        assert_ne!(a, TypeHandle::new("pkg.Other"));
    }

    #[test]
    fn test_object_ref_downcast() {
        let obj = ObjectRef::new("test.Gauge", Gauge(7));
        assert_eq!(obj.type_name(), "test.Gauge");
        assert_eq!(obj.downcast_ref::<Gauge>().map(|p| p.0), Some(7));
        assert!(obj.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_object_ref_identity() {
        let obj = ObjectRef::new("test.Gauge", Gauge(1));
        let alias = obj.clone();
        let other = ObjectRef::new("test.Gauge", Gauge(1));
        assert!(obj.ptr_eq(&alias));
        assert_eq!(Value::Object(obj.clone()), Value::Object(alias));
        assert_ne!(Value::Object(obj), Value::Object(other));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(1).type_name(), "int");
        assert_eq!(Value::from(1.5).type_name(), "float");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::List(vec![]).type_name(), "list");
        assert_eq!(Value::Type(TypeHandle::new("a.B")).type_name(), "type");
        let obj = ObjectRef::new("test.Gauge", Gauge(0));
        assert_eq!(Value::Object(obj).type_name(), "test.Gauge");
    }

    #[test]
    fn test_float_accessor_widens_ints() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::from("3").as_float(), None);
    }

    #[test]
    fn test_from_json() {
        let value = Value::try_from(json!({"n": "foo", "a": [41, 1.5, null, true]})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["n"], Value::from("foo"));
        assert_eq!(
            map["a"],
            Value::List(vec![
                Value::Int(41),
                Value::Float(1.5),
                Value::Null,
                Value::Bool(true)
            ])
        );
    }

    #[test]
    fn test_from_json_rejects_oversized_integer() {
        let err = Value::try_from(json!([u64::MAX])).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn test_serialize_markers() {
        let obj = ObjectRef::new("test.Gauge", Gauge(0));
        assert_eq!(
            serde_json::to_value(Value::Object(obj)).unwrap(),
            json!({"$object": "test.Gauge"})
        );
        assert_eq!(
            serde_json::to_value(Value::Type(TypeHandle::new("a.B"))).unwrap(),
            json!({"$type": "a.B"})
        );
        assert_eq!(serde_json::to_value(Value::Float(f64::NAN)).unwrap(), json!(null));
    }

    #[test]
    fn test_serialize_nested() {
        let value = Value::List(vec![Value::Int(1), Value::from("two"), Value::Null]);
        assert_eq!(serde_json::to_value(&value).unwrap(), json!([1, "two", null]));
    }
}
