//! Structured key/value pairs attached to a record.

use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// A named value carried alongside a log message.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    /// Field from anything `serde_json` can convert directly
    /// (strings, numbers, booleans, vectors of those, `Value`).
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Field from any serializable value.
    ///
    /// A value that fails to serialize is recorded as a string describing
    /// the failure rather than dropping the field.
    pub fn serialized<T>(key: impl Into<Cow<'static, str>>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")));
        Self {
            key: key.into(),
            value,
        }
    }

    /// Field holding the `Display` rendering of `value`
    pub fn display(key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        Self::new(key, value.to_string())
    }

    /// Field holding the `Debug` rendering of `value`
    pub fn debug(key: impl Into<Cow<'static, str>>, value: impl fmt::Debug) -> Self {
        Self::new(key, format!("{value:?}"))
    }

    /// Field under the `error` key holding the error's message
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::new("error", err.to_string())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}
