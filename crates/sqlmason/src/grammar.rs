//! Per-dialect SQL grammar: identifier quoting and statement assembly.
//!
//! A [`Grammar`] is a stateless rendering strategy. It owns the dialect's
//! quote characters, wraps identifiers and table references, and assembles
//! the fixed clause skeleton of each statement kind from already-compiled
//! clause fragments. Every dialect emits `?` placeholders; positional
//! conversion is the driver's concern.

use crate::error::{QueryError, QueryResult};
use crate::ident::TableIdent;
use crate::raw::Raw;
use regex::Regex;
use std::sync::LazyLock;

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Look up a dialect by its configuration name (case-insensitive).
    ///
    /// Accepted: `mysql`/`mariadb`, `postgresql`/`postgres`/`pgsql`,
    /// `sqlite`/`sqlite3`. Anything else is a fatal
    /// [`QueryError::UnsupportedDialect`].
    pub fn from_name(name: &str) -> QueryResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgresql" | "postgres" | "pgsql" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(QueryError::UnsupportedDialect(name.trim().to_string())),
        }
    }
}

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)(?:\s+AS\s+|\s+)([A-Za-z0-9_]+)$").expect("valid regex"));

/// Stateless rendering strategy for one dialect.
///
/// Cheap to copy and safe to share across any number of builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    dialect: Dialect,
    table_quote: char,
    column_quote: char,
}

impl Grammar {
    pub fn new(dialect: Dialect) -> Self {
        let quote = match dialect {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        Self {
            dialect,
            table_quote: quote,
            column_quote: quote,
        }
    }

    pub fn mysql() -> Self {
        Self::new(Dialect::MySql)
    }

    pub fn postgres() -> Self {
        Self::new(Dialect::Postgres)
    }

    pub fn sqlite() -> Self {
        Self::new(Dialect::Sqlite)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Placeholder list for `count` bind positions: `?, ?, ?`.
    pub fn placeholders(&self, count: usize) -> String {
        let mut out = String::with_capacity(count * 3);
        for i in 0..count {
            if i > 0 {
                out.push_str(", ");
            }
            out.push('?');
        }
        out
    }

    /// Quote a column expression.
    ///
    /// Handles `*`, `table.column`, `table.*`, `expr AS alias` / `expr alias`
    /// and `{...}` raw passthrough.
    pub fn wrap_identifier(&self, identifier: &str) -> String {
        if Raw::is(identifier) {
            return Raw::get(identifier).to_string();
        }

        if identifier == "*" {
            return identifier.to_string();
        }

        if let Some(caps) = ALIAS_RE.captures(identifier) {
            let field = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let alias = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            return format!(
                "{} AS {}",
                self.wrap_identifier_plain(field),
                self.quote_column(alias)
            );
        }

        self.wrap_identifier_plain(identifier)
    }

    /// Quote an identifier without alias handling.
    pub(crate) fn wrap_identifier_plain(&self, identifier: &str) -> String {
        let segments: Vec<&str> = identifier.split('.').collect();
        if segments.len() == 2 {
            let table = segments[0].trim();
            let column = segments[1].trim();
            if column == "*" {
                return format!("{}.*", self.quote_table(table));
            }
            return format!("{}.{}", self.quote_table(table), self.quote_column(column));
        }
        self.quote_column(identifier.trim())
    }

    /// Render a table reference, including subquery targets.
    pub fn wrap_table(&self, table: &TableIdent) -> String {
        if table.is_subquery() {
            let wrapped = format!("({})", table.table());
            return match table.alias() {
                Some(alias) => format!("{} AS {}", wrapped, self.quote_table(alias)),
                None => wrapped,
            };
        }

        let wrapped = self.quote_table(table.table());
        match table.alias() {
            Some(alias) => format!("{} AS {}", wrapped, self.quote_table(alias)),
            None => wrapped,
        }
    }

    fn quote_table(&self, name: &str) -> String {
        format!("{0}{1}{0}", self.table_quote, name)
    }

    fn quote_column(&self, name: &str) -> String {
        format!("{0}{1}{0}", self.column_quote, name)
    }

    /// Assemble a SELECT statement from compiled clause fragments.
    pub fn compile_select(
        &self,
        table: &str,
        columns: &[String],
        clauses: &[String],
        distinct: bool,
    ) -> String {
        let cols = if columns.is_empty() || (columns.len() == 1 && columns[0] == "*") {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| self.wrap_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let table_sql = self.wrap_table(&TableIdent::parse(table));
        let mut sql = format!(
            "SELECT {}{} FROM {}",
            if distinct { "DISTINCT " } else { "" },
            cols,
            table_sql
        );
        self.append_clauses(&mut sql, clauses);
        sql
    }

    /// Assemble an INSERT statement; the VALUES clause fragment carries the
    /// column list and placeholder groups.
    pub fn compile_insert(&self, table: &str, clauses: &[String]) -> String {
        let mut sql = format!("INSERT INTO {}", self.wrap_table(&TableIdent::parse(table)));
        self.append_clauses(&mut sql, clauses);
        sql
    }

    /// Assemble an UPDATE statement (JOIN, SET, WHERE fragments in order).
    pub fn compile_update(&self, table: &str, clauses: &[String]) -> String {
        let mut sql = format!("UPDATE {}", self.wrap_table(&TableIdent::parse(table)));
        self.append_clauses(&mut sql, clauses);
        sql
    }

    /// Assemble a DELETE statement.
    pub fn compile_delete(&self, table: &str, clauses: &[String]) -> String {
        let mut sql = format!(
            "DELETE FROM {}",
            self.wrap_table(&TableIdent::parse(table))
        );
        self.append_clauses(&mut sql, clauses);
        sql
    }

    fn append_clauses(&self, sql: &mut String, clauses: &[String]) {
        for fragment in clauses {
            sql.push(' ');
            sql.push_str(fragment);
        }
    }
}
