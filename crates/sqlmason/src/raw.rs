//! The `{...}` raw-expression convention.
//!
//! Any string of the form `{<sql>}` anywhere a column or value is expected
//! means "emit the content between the braces verbatim, with no quoting and
//! no placeholder". The same helpers back every clause boundary so the
//! convention behaves identically everywhere.

/// A verbatim SQL fragment that bypasses quoting and parameterization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub String);

impl Raw {
    /// Create a raw fragment from already-final SQL text.
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// Whether `value` uses the `{...}` convention.
    pub fn is(value: &str) -> bool {
        value.len() >= 2 && value.starts_with('{') && value.ends_with('}')
    }

    /// Strip the surrounding braces; non-raw input is returned unchanged.
    pub fn get(value: &str) -> &str {
        if Self::is(value) {
            &value[1..value.len() - 1]
        } else {
            value
        }
    }
}

/// Shorthand for [`Raw::new`].
pub fn raw(sql: impl Into<String>) -> Raw {
    Raw::new(sql)
}
