//! Bind values and argument conversion.
//!
//! [`Value`] is the positional bind value paired with a `?` placeholder in
//! compiled SQL. [`Arg`] is the tagged literal-or-raw sum type used wherever
//! a value position may also accept a verbatim SQL fragment; string inputs
//! are funneled through the `{...}` convention exactly once, in
//! `From<&str> for Arg`.

use crate::raw::Raw;
use serde::Serialize;

/// A positional bind value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    #[cfg(feature = "chrono")]
    Timestamp(chrono::DateTime<chrono::Utc>),
}

impl Value {
    /// Render this value as plain JSON, for cache payloads and debugging.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Value::from(*v),
            Value::Text(v) => serde_json::Value::String(v.clone()),
            Value::Bytes(v) => serde_json::Value::from(v.clone()),
            #[cfg(feature = "uuid")]
            Value::Uuid(v) => serde_json::Value::String(v.to_string()),
            #[cfg(feature = "chrono")]
            Value::Timestamp(v) => serde_json::Value::String(v.to_rfc3339()),
        }
    }
}

macro_rules! impl_value_from_int {
    ($($ty:ty),+) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(v as i64)
            }
        }
    )+};
}

impl_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// A value destined for a clause position: either a literal bind value
/// (emits `?` and records a binding) or a raw SQL fragment emitted verbatim
/// with no binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Value),
    Raw(String),
}

impl Arg {
    /// Wrap a bind value, bypassing `{...}` detection. Use this for data
    /// values that legitimately start and end with braces.
    pub fn literal(value: impl Into<Value>) -> Self {
        Arg::Literal(value.into())
    }

    /// Wrap a verbatim SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Arg::Raw(sql.into())
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Arg::Raw(_))
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Literal(value)
    }
}

impl From<Raw> for Arg {
    fn from(raw: Raw) -> Self {
        Arg::Raw(raw.0)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        if Raw::is(s) {
            Arg::Raw(Raw::get(s).to_string())
        } else {
            Arg::Literal(Value::Text(s.to_string()))
        }
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        if Raw::is(&s) {
            Arg::Raw(Raw::get(&s).to_string())
        } else {
            Arg::Literal(Value::Text(s))
        }
    }
}

macro_rules! impl_arg_from_literal {
    ($($ty:ty),+) => {$(
        impl From<$ty> for Arg {
            fn from(v: $ty) -> Self {
                Arg::Literal(v.into())
            }
        }
    )+};
}

impl_arg_from_literal!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64);

#[cfg(feature = "uuid")]
impl_arg_from_literal!(uuid::Uuid);

#[cfg(feature = "chrono")]
impl_arg_from_literal!(chrono::DateTime<chrono::Utc>);

/// Conversion of heterogeneous positional parameters into bind values.
///
/// Implemented for tuples up to eight elements so call sites can pass mixed
/// types directly: `builder.where_("a = ? AND b = ?", (1, "x"))`.
pub trait IntoBindings {
    fn into_bindings(self) -> Vec<Value>;
}

impl IntoBindings for () {
    fn into_bindings(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoBindings for Vec<Value> {
    fn into_bindings(self) -> Vec<Value> {
        self
    }
}

macro_rules! impl_into_bindings_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> IntoBindings for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_bindings(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_bindings_tuple!(A);
impl_into_bindings_tuple!(A, B);
impl_into_bindings_tuple!(A, B, C);
impl_into_bindings_tuple!(A, B, C, D);
impl_into_bindings_tuple!(A, B, C, D, E);
impl_into_bindings_tuple!(A, B, C, D, E, F);
impl_into_bindings_tuple!(A, B, C, D, E, F, G);
impl_into_bindings_tuple!(A, B, C, D, E, F, G, H);

/// Build one INSERT row as ordered `(column, value)` pairs.
///
/// # Example
/// ```ignore
/// let row = row! { "user_id" => 1, "action" => "login" };
/// ```
#[macro_export]
macro_rules! row {
    () => {
        Vec::<(String, $crate::Value)>::new()
    };
    ($($col:expr => $val:expr),+ $(,)?) => {
        vec![$(($col.to_string(), $crate::Value::from($val))),+]
    };
}
