//! Traits for converting between bridge values and Rust types.
//!
//! Native members receive their arguments as `&[Value]`. `FromValue` pulls
//! typed arguments out of that slice, `ToValue` turns Rust results back
//! into values.
//!
//! # Example
//!
//! ```ignore
//! use tether_sdk::{arg, MethodEntry, ToValue};
//!
//! let add = MethodEntry::static_fn("add", 2, |args| {
//!     let a: i64 = arg(args, 0)?;
//!     let b: i64 = arg(args, 1)?;
//!     Ok((a + b).to_value())
//! });
//! ```

use crate::error::{NativeError, NativeResult};
use crate::value::{ObjectRef, TypeHandle, Value};

/// Convert from a bridge value to a Rust type.
pub trait FromValue: Sized {
    /// Convert, returning an error if the value has the wrong shape.
    fn from_value(value: &Value) -> NativeResult<Self>;
}

/// Convert from a Rust type to a bridge value.
pub trait ToValue {
    /// Convert to a value.
    fn to_value(self) -> Value;
}

fn mismatch(expected: &str, value: &Value) -> NativeError {
    NativeError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

/// Extract the positional argument at `index` as a `T`.
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> NativeResult<T> {
    let value = args.get(index).ok_or_else(|| {
        NativeError::ArgumentError(format!(
            "missing argument {} (got {})",
            index,
            args.len()
        ))
    })?;
    T::from_value(value)
        .map_err(|e| NativeError::ArgumentError(format!("argument {}: {}", index, e)))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> NativeResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> NativeResult<Self> {
        let i = value.as_int().ok_or_else(|| mismatch("int", value))?;
        i32::try_from(i).map_err(|_| NativeError::ArgumentError(format!("{} overflows i32", i)))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value.as_float().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value.as_object().cloned().ok_or_else(|| mismatch("object", value))
    }
}

impl FromValue for TypeHandle {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value.as_type().cloned().ok_or_else(|| mismatch("type", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> NativeResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> NativeResult<Self> {
        value
            .as_list()
            .ok_or_else(|| mismatch("list", value))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: Into<Value>> ToValue for T {
    fn to_value(self) -> Value {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_extraction() {
        let args = vec![Value::Int(41), Value::from("x")];
        assert_eq!(arg::<i64>(&args, 0).unwrap(), 41);
        assert_eq!(arg::<String>(&args, 1).unwrap(), "x");
    }

    #[test]
    fn test_arg_missing_and_mismatch() {
        let args = vec![Value::from("x")];
        let missing = arg::<i64>(&args, 3).unwrap_err();
        assert!(missing.to_string().contains("missing argument 3"));

        let wrong = arg::<i64>(&args, 0).unwrap_err();
        assert!(wrong.to_string().contains("expected int, got string"));
    }

    #[test]
    fn test_i32_overflow() {
        let err = i32::from_value(&Value::Int(i64::MAX)).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_option_and_vec() {
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(&Value::Int(2)).unwrap(), Some(2));
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(Vec::<i64>::from_value(&list).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_to_value() {
        assert_eq!(42i64.to_value(), Value::Int(42));
        assert_eq!(true.to_value(), Value::Bool(true));
        assert_eq!(().to_value(), Value::Null);
    }
}
