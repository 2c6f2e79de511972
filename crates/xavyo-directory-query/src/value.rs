//! Attribute value types
//!
//! Domain-side values ([`AttributeValue`]), directory-side raw values
//! ([`RawValue`]) and the lazily evaluated value source used by filter
//! expressions ([`ValueSource`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{QueryError, QueryResult};

/// Generalized time layout used when a date-time is sent without a converter.
pub(crate) const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";

/// A domain value, which may be single or multi-valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value (null).
    Null,
    /// A single string value.
    String(String),
    /// A single integer value.
    Integer(i64),
    /// A single boolean value.
    Boolean(bool),
    /// A single floating-point value.
    Float(f64),
    /// A date-time value.
    DateTime(DateTime<Utc>),
    /// Binary data.
    Binary(Vec<u8>),
    /// Multiple values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Check if this is a null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Get as a string if this is a single string value.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a date-time if this is a date-time value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            AttributeValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Get as an array if this is multi-valued.
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<AttributeValue>> {
        match self {
            AttributeValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Check if this is multi-valued.
    #[must_use]
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, AttributeValue::Array(_))
    }

    /// Short type name, used in conversion error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::String(_) => "string",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Float(_) => "float",
            AttributeValue::DateTime(_) => "datetime",
            AttributeValue::Binary(_) => "binary",
            AttributeValue::Array(_) => "array",
        }
    }

    /// Render this value in its plain directory form, without a converter.
    ///
    /// Null and multi-valued values have no single directory representation
    /// and are rejected.
    pub fn to_raw(&self) -> QueryResult<RawValue> {
        match self {
            AttributeValue::String(s) => Ok(RawValue::Text(s.clone())),
            AttributeValue::Integer(i) => Ok(RawValue::Text(i.to_string())),
            AttributeValue::Float(f) => Ok(RawValue::Text(f.to_string())),
            AttributeValue::Boolean(b) => {
                Ok(RawValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()))
            }
            AttributeValue::DateTime(dt) => Ok(RawValue::Text(
                dt.format(GENERALIZED_TIME_FORMAT).to_string(),
            )),
            AttributeValue::Binary(b) => Ok(RawValue::Binary(b.clone())),
            AttributeValue::Null | AttributeValue::Array(_) => {
                Err(QueryError::invalid_argument(format!(
                    "a {} value cannot be used as a single directory value",
                    self.kind()
                )))
            }
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<u32> for AttributeValue {
    fn from(i: u32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(dt)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Binary(bytes)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(values: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(values)
    }
}

/// A value as the directory stores it: text or an octet string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// UTF-8 text value.
    Text(String),
    /// Binary (octet string) value.
    Binary(Vec<u8>),
}

impl RawValue {
    /// The value's bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawValue::Text(s) => s.as_bytes(),
            RawValue::Binary(b) => b,
        }
    }

    /// The value as text, if it is (or decodes as) UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Binary(b) => std::str::from_utf8(b).ok(),
        }
    }

    /// Convert to the domain value used when no converter applies.
    #[must_use]
    pub fn into_attribute_value(self) -> AttributeValue {
        match self {
            RawValue::Text(s) => AttributeValue::String(s),
            RawValue::Binary(b) => AttributeValue::Binary(b),
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(b: Vec<u8>) -> Self {
        RawValue::Binary(b)
    }
}

/// Callback producing a value at resolution time.
pub type DeferredValue = Arc<dyn Fn() -> AttributeValue + Send + Sync>;

/// Where an expression's comparison value comes from.
#[derive(Clone)]
pub enum ValueSource {
    /// A value known when the expression is built.
    Literal(AttributeValue),
    /// A value computed once, when the expression is resolved.
    Deferred(DeferredValue),
}

impl ValueSource {
    /// Wrap a callback as a deferred value.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> AttributeValue + Send + Sync + 'static,
    {
        ValueSource::Deferred(Arc::new(f))
    }

    /// Evaluate the source.
    #[must_use]
    pub fn evaluate(&self) -> AttributeValue {
        match self {
            ValueSource::Literal(v) => v.clone(),
            ValueSource::Deferred(f) => f(),
        }
    }

    /// Replace a deferred callback with its result. Literal values are left alone.
    pub fn settle(&mut self) {
        if let ValueSource::Deferred(f) = self {
            *self = ValueSource::Literal(f());
        }
    }

    /// Check if the value is still waiting on its callback.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, ValueSource::Deferred(_))
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            ValueSource::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<AttributeValue> for ValueSource {
    fn from(value: AttributeValue) -> Self {
        ValueSource::Literal(value)
    }
}
