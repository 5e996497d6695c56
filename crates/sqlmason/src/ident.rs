//! Table identifier parsing.
//!
//! [`TableIdent`] splits a raw table string into base name and optional
//! alias, using the `AS` keyword or plain-space syntax, or wraps an
//! already-compiled subquery plus alias. Instances are never mutated after
//! construction.

use regex::Regex;
use std::sync::LazyLock;

static AS_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+AS\s+").expect("valid regex"));

static PLAIN_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(\S+)$").expect("valid regex"));

/// A parsed table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIdent {
    table: String,
    alias: Option<String>,
    subquery: bool,
}

impl TableIdent {
    /// Parse a raw table string.
    ///
    /// `users`, `users AS u` and `users u` are all accepted; the `AS` form
    /// is matched case-insensitively and wins over the plain-space form.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if let Some(m) = AS_SPLIT.find(trimmed) {
            return Self {
                table: trimmed[..m.start()].trim().to_string(),
                alias: Some(trimmed[m.end()..].trim().to_string()),
                subquery: false,
            };
        }

        if let Some(caps) = PLAIN_ALIAS.captures(trimmed) {
            return Self {
                table: caps[1].to_string(),
                alias: Some(caps[2].to_string()),
                subquery: false,
            };
        }

        Self {
            table: trimmed.to_string(),
            alias: None,
            subquery: false,
        }
    }

    /// Wrap already-compiled SQL as an aliased derived table.
    pub fn subquery(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: sql.into(),
            alias: Some(alias.into()),
            subquery: true,
        }
    }

    /// Base table name, or the compiled SQL for subqueries.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn is_subquery(&self) -> bool {
        self.subquery
    }
}
