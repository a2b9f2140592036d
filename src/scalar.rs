//! Scalar value codecs.
//!
//! Pure conversions between primitive/timestamp/byte-buffer values and their
//! structured representation. Each codec is invoked by the structural
//! dispatch in the serializer and deserializer and owns no recursion.

use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::error::CodecError;
use crate::reflect::Reflect;
use crate::schema::TypeRef;

// -----------------------------------------------------------------------------
// Write side

macro_rules! try_write_int {
    ($value:expr, $(($ty:ty, $via:ty)),* $(,)?) => {
        $(
            if let Some(n) = $value.downcast_ref::<$ty>() {
                return Ok(Value::Number(Number::from(*n as $via)));
            }
        )*
    };
}

/// Encodes one scalar value according to its declared [`TypeRef`].
pub(crate) fn write_scalar(value: &dyn Reflect, ty: TypeRef) -> Result<Value, CodecError> {
    match ty {
        TypeRef::Bool => match value.downcast_ref::<bool>() {
            Some(b) => Ok(Value::Bool(*b)),
            None => Err(mismatch(ty, value.type_name())),
        },
        TypeRef::Int => {
            try_write_int!(
                value,
                (i8, i64),
                (i16, i64),
                (i32, i64),
                (i64, i64),
                (isize, i64),
                (u8, u64),
                (u16, u64),
                (u32, u64),
                (u64, u64),
                (usize, u64),
            );
            Err(mismatch(ty, value.type_name()))
        }
        TypeRef::Float => {
            let x = if let Some(x) = value.downcast_ref::<f64>() {
                *x
            } else if let Some(x) = value.downcast_ref::<f32>() {
                f64::from(*x)
            } else {
                return Err(mismatch(ty, value.type_name()));
            };
            match Number::from_f64(x) {
                Some(n) => Ok(Value::Number(n)),
                None => Err(CodecError::TypeMismatch {
                    expected: Cow::Borrowed("a finite float"),
                    found: Cow::Borrowed("a non-finite float"),
                }),
            }
        }
        TypeRef::String => match value.downcast_ref::<String>() {
            Some(s) => Ok(Value::String(s.clone())),
            None => Err(mismatch(ty, value.type_name())),
        },
        TypeRef::Timestamp => match value.downcast_ref::<DateTime<Utc>>() {
            Some(ts) => Ok(Value::String(
                ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            None => Err(mismatch(ty, value.type_name())),
        },
        TypeRef::Bytes => match value.downcast_ref::<Vec<u8>>() {
            Some(bytes) => Ok(Value::String(BASE64.encode(bytes))),
            None => Err(mismatch(ty, value.type_name())),
        },
        TypeRef::Class(_) | TypeRef::Dynamic => Err(mismatch(ty, value.type_name())),
    }
}

// -----------------------------------------------------------------------------
// Read side

/// Decodes one scalar value according to its declared [`TypeRef`].
///
/// No implicit coercion: the structured value must already be of the exact
/// kind the declared type calls for. The only latitude is numeric width
/// (integers surface as `i64`, or `u64` beyond the signed range) and the
/// list-of-integers fallback form for byte buffers.
pub(crate) fn read_scalar(value: &Value, ty: TypeRef) -> Result<Box<dyn Reflect>, CodecError> {
    match ty {
        TypeRef::Bool => match value.as_bool() {
            Some(b) => Ok(Box::new(b)),
            None => Err(mismatch(ty, json_kind(value))),
        },
        TypeRef::Int => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Box::new(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Box::new(u))
                } else {
                    Err(mismatch(ty, "a float"))
                }
            }
            other => Err(mismatch(ty, json_kind(other))),
        },
        TypeRef::Float => match value.as_f64() {
            Some(x) => Ok(Box::new(x)),
            None => Err(mismatch(ty, json_kind(value))),
        },
        TypeRef::String => match value.as_str() {
            Some(s) => Ok(Box::new(s.to_owned())),
            None => Err(mismatch(ty, json_kind(value))),
        },
        TypeRef::Timestamp => {
            let text = value.as_str().ok_or_else(|| mismatch(ty, json_kind(value)))?;
            match DateTime::parse_from_rfc3339(text) {
                Ok(ts) => Ok(Box::new(ts.with_timezone(&Utc))),
                Err(_) => Err(mismatch(ty, "a malformed timestamp string")),
            }
        }
        TypeRef::Bytes => read_bytes(value).map(|bytes| Box::new(bytes) as Box<dyn Reflect>),
        TypeRef::Class(_) | TypeRef::Dynamic => Err(mismatch(ty, json_kind(value))),
    }
}

/// Byte buffers arrive either as one opaque base64 token or, in the fallback
/// form, as a list of integers in `0..=255`.
fn read_bytes(value: &Value) -> Result<Vec<u8>, CodecError> {
    match value {
        Value::String(text) => BASE64
            .decode(text)
            .map_err(|_| mismatch(TypeRef::Bytes, "a malformed base64 string")),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| mismatch(TypeRef::Bytes, "a list holding non-byte values"))
            })
            .collect(),
        other => Err(mismatch(TypeRef::Bytes, json_kind(other))),
    }
}

// -----------------------------------------------------------------------------
// Zero values

/// The declared type's zero value, where one exists.
pub(crate) fn zero_scalar(ty: TypeRef) -> Option<Value> {
    match ty {
        TypeRef::Int => Some(Value::Number(Number::from(0))),
        TypeRef::Float => Number::from_f64(0.0).map(Value::Number),
        TypeRef::String => Some(Value::String(String::new())),
        _ => None,
    }
}

/// Whether an already-encoded scalar holds its declared type's zero value.
pub(crate) fn is_zero_scalar(value: &Value, ty: TypeRef) -> bool {
    match ty {
        TypeRef::Int => value.as_i64() == Some(0) || value.as_u64() == Some(0),
        TypeRef::Float => value.as_f64() == Some(0.0),
        TypeRef::String => value.as_str() == Some(""),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Diagnostics

/// Human-readable kind of a structured value, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(ty: TypeRef, found: impl Into<Cow<'static, str>>) -> CodecError {
    CodecError::TypeMismatch {
        expected: Cow::Borrowed(ty.expected()),
        found: found.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn integers_keep_exact_kind() {
        let encoded = write_scalar(&42_u16, TypeRef::Int).unwrap();
        assert_eq!(encoded, Value::from(42));

        let decoded = read_scalar(&encoded, TypeRef::Int).unwrap();
        assert_eq!(decoded.take::<i64>().unwrap(), 42);

        let err = read_scalar(&Value::from(1.5), TypeRef::Int).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn strings_are_not_coerced() {
        let err = read_scalar(&Value::from(3), TypeRef::String).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn timestamps_roundtrip_through_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2021, 7, 14, 9, 30, 0).unwrap();
        let encoded = write_scalar(&ts, TypeRef::Timestamp).unwrap();
        assert_eq!(encoded, Value::from("2021-07-14T09:30:00Z"));

        let decoded = read_scalar(&encoded, TypeRef::Timestamp).unwrap();
        assert_eq!(decoded.take::<DateTime<Utc>>().unwrap(), ts);
    }

    #[test]
    fn bytes_accept_token_and_list_forms() {
        let bytes = vec![1_u8, 2, 255];
        let encoded = write_scalar(&bytes, TypeRef::Bytes).unwrap();
        assert_eq!(encoded, Value::from("AQL/"));

        let decoded = read_scalar(&encoded, TypeRef::Bytes).unwrap();
        assert_eq!(decoded.take::<Vec<u8>>().unwrap(), bytes);

        let fallback = serde_json::json!([1, 2, 255]);
        let decoded = read_scalar(&fallback, TypeRef::Bytes).unwrap();
        assert_eq!(decoded.take::<Vec<u8>>().unwrap(), bytes);

        let err = read_scalar(&serde_json::json!([1, 256]), TypeRef::Bytes).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn non_finite_floats_are_rejected_on_write() {
        let err = write_scalar(&f64::NAN, TypeRef::Float).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }
}
