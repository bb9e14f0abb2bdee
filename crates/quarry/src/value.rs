//! Driver-neutral bind and column values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single SQL value, either bound as a parameter or read back from a row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Storage class name, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }

    /// Hashable form used to match related rows back to their parents.
    ///
    /// Numeric text and whole reals collapse onto integers so that a key read
    /// back as `"3"` still matches `3`. `Null` never matches anything.
    pub(crate) fn key(&self) -> Option<Key> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(Key::Int(*i)),
            Value::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(Key::Int(*f as i64)),
            Value::Real(f) => Some(Key::Text(f.to_string())),
            Value::Text(s) => Some(match s.parse::<i64>() {
                Ok(i) => Key::Int(i),
                Err(_) => Key::Text(s.clone()),
            }),
            Value::Blob(b) => Some(Key::Bytes(b.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Key {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

/// A value could not be converted into the requested Rust type.
#[derive(Debug, Clone, Error)]
#[error("expected {expected}, found {found}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: String,
}

impl ConversionError {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.type_name().to_string(),
        }
    }

    fn invalid(expected: &'static str, detail: impl std::fmt::Display) -> Self {
        Self {
            expected,
            found: detail.to_string(),
        }
    }
}

/// Convert a Rust value into a bind parameter.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Convert a column value into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for &Value {
    fn into_value(self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Integer(i64::from(self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    let raw = match &value {
                        Value::Integer(i) => *i,
                        Value::Text(s) => s
                            .parse::<i64>()
                            .map_err(|_| ConversionError::new(stringify!($ty), &value))?,
                        _ => return Err(ConversionError::new(stringify!($ty), &value)),
                    };
                    <$ty>::try_from(raw)
                        .map_err(|_| ConversionError::invalid(stringify!($ty), raw))
                }
            }
        )*
    };
}

impl_integer!(i64, i32, i16, u32, u16, u8);

impl IntoValue for u64 {
    fn into_value(self) -> Value {
        // Values beyond i64::MAX cannot be stored as an SQLite integer.
        match i64::try_from(self) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(self.to_string()),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match &value {
            Value::Integer(i) => u64::try_from(*i).map_err(|_| ConversionError::invalid("u64", i)),
            Value::Text(s) => s.parse().map_err(|_| ConversionError::new("u64", &value)),
            _ => Err(ConversionError::new("u64", &value)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Real(f64::from(self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match &value {
            Value::Real(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            Value::Text(s) => s.parse().map_err(|_| ConversionError::new("f64", &value)),
            _ => Err(ConversionError::new("f64", &value)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match &value {
            Value::Integer(i) => Ok(*i != 0),
            Value::Text(s) => match s.as_str() {
                "1" | "true" | "t" => Ok(true),
                "0" | "false" | "f" => Ok(false),
                _ => Err(ConversionError::new("bool", &value)),
            },
            _ => Err(ConversionError::new("bool", &value)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(f) => Ok(f.to_string()),
            Value::Blob(b) => {
                String::from_utf8(b).map_err(|e| ConversionError::invalid("String", e))
            }
            Value::Null => Err(ConversionError::new("String", &Value::Null)),
        }
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Blob(self)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Blob(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(ConversionError::new("Vec<u8>", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::Text(self.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let Value::Text(s) = &value else {
            return Err(ConversionError::new("NaiveDateTime", &value));
        };
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .ok_or_else(|| ConversionError::invalid("NaiveDateTime", s))
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Text(self.to_rfc3339())
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match &value {
            Value::Text(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => Ok(dt.with_timezone(&Utc)),
                Err(_) => NaiveDateTime::from_value(value.clone()).map(|naive| naive.and_utc()),
            },
            Value::Integer(secs) => DateTime::from_timestamp(*secs, 0)
                .ok_or_else(|| ConversionError::invalid("DateTime<Utc>", secs)),
            _ => Err(ConversionError::new("DateTime<Utc>", &value)),
        }
    }
}

impl IntoValue for NaiveDate {
    fn into_value(self) -> Value {
        Value::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let Value::Text(s) = &value else {
            return Err(ConversionError::new("NaiveDate", &value));
        };
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| ConversionError::invalid("NaiveDate", e))
    }
}

impl IntoValue for Uuid {
    fn into_value(self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match &value {
            Value::Text(s) => Uuid::parse_str(s).map_err(|e| ConversionError::invalid("Uuid", e)),
            Value::Blob(b) => Uuid::from_slice(b).map_err(|e| ConversionError::invalid("Uuid", e)),
            _ => Err(ConversionError::new("Uuid", &value)),
        }
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self) -> Value {
        match self {
            serde_json::Value::Null => Value::Null,
            other => Value::Text(other.to_string()),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Integer(i) => Ok(i.into()),
            Value::Real(f) => Ok(serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null)),
            Value::Text(s) => {
                serde_json::from_str(&s).map_err(|e| ConversionError::invalid("json", e))
            }
            Value::Blob(b) => {
                serde_json::from_slice(&b).map_err(|e| ConversionError::invalid("json", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalizes_numeric_text() {
        assert_eq!(Value::Text("3".into()).key(), Value::Integer(3).key());
        assert_eq!(Value::Real(3.0).key(), Some(Key::Int(3)));
        assert_ne!(Value::Text("abc".into()).key(), Value::Integer(3).key());
        assert_eq!(Value::Null.key(), None);
    }

    #[test]
    fn integer_conversions_check_range() {
        assert_eq!(i32::from_value(Value::Integer(42)).unwrap(), 42);
        assert!(u8::from_value(Value::Integer(300)).is_err());
        assert!(i64::from_value(Value::Text("nope".into())).is_err());
        assert_eq!(i64::from_value(Value::Text("7".into())).unwrap(), 7);
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Some(5i64).into_value(), Value::Integer(5));
        assert_eq!(None::<String>.into_value(), Value::Null);
    }

    #[test]
    fn bool_round_trips_through_integer() {
        assert_eq!(true.into_value(), Value::Integer(1));
        assert!(bool::from_value(Value::Integer(1)).unwrap());
        assert!(!bool::from_value(Value::Integer(0)).unwrap());
    }

    #[test]
    fn datetime_parses_sqlite_text() {
        let dt = NaiveDateTime::from_value(Value::Text("2024-03-01 10:20:30".into())).unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "10:20:30");

        let utc = DateTime::<Utc>::from_value(Value::Text("2024-03-01T10:20:30Z".into())).unwrap();
        assert_eq!(utc.timestamp(), dt.and_utc().timestamp());
    }

    #[test]
    fn uuid_and_json_conversions() {
        let id = Uuid::new_v4();
        assert_eq!(Uuid::from_value(id.into_value()).unwrap(), id);

        let json = serde_json::json!({"a": 1});
        let stored = json.clone().into_value();
        assert_eq!(serde_json::Value::from_value(stored).unwrap(), json);
    }

    #[test]
    fn conversion_error_names_types() {
        let err = i64::from_value(Value::Blob(vec![1])).unwrap_err();
        assert_eq!(err.to_string(), "expected i64, found blob");
    }
}
