//! SELECT statement builder.

use super::capability::{
    BuilderAccess, GroupByCapable, HavingCapable, JoinCapable, LimitCapable, OrderByCapable,
    WhenCapable, WhereCapable,
};
use super::{BuilderCore, BuiltQuery};
use crate::cache::CacheManager;
use crate::clause::Clause;
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, Row};
use crate::grammar::Grammar;
use std::sync::Arc;

/// Fluent SELECT builder.
///
/// Compiles to `SELECT [DISTINCT] columns FROM table [clauses in priority
/// order]`. Result methods require an attached executor and honor the
/// session's cache when one is configured.
#[derive(Clone)]
pub struct SelectBuilder {
    core: BuilderCore,
    columns: Vec<String>,
    distinct: bool,
    executor: Option<Arc<dyn Executor>>,
    cache: Option<CacheManager>,
}

impl SelectBuilder {
    pub fn new(table: &str, grammar: Grammar) -> Self {
        Self {
            core: BuilderCore::new(table, grammar),
            columns: vec!["*".to_string()],
            distinct: false,
            executor: None,
            cache: None,
        }
    }

    pub(crate) fn with_runtime(
        table: &str,
        grammar: Grammar,
        executor: Option<Arc<dyn Executor>>,
        cache: Option<CacheManager>,
    ) -> Self {
        Self {
            executor,
            cache,
            ..Self::new(table, grammar)
        }
    }

    /// Set the source table; overrides the constructor argument.
    pub fn from(mut self, table: &str) -> Self {
        self.core.table = table.to_string();
        self
    }

    /// Replace the column list.
    pub fn select(mut self, columns: &[&str]) -> Self {
        if !columns.is_empty() {
            self.columns = columns.iter().map(|c| c.to_string()).collect();
        }
        self
    }

    /// Append one column; the implicit `*` is replaced on first use.
    pub fn add_select(mut self, column: &str) -> Self {
        if self.columns.len() == 1 && self.columns[0] == "*" {
            self.columns[0] = column.to_string();
        } else {
            self.columns.push(column.to_string());
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Compile to SQL plus ordered bindings. Recomputed from current clause
    /// state on every call.
    pub fn build(&self) -> QueryResult<BuiltQuery> {
        self.core.check_build_error()?;
        self.core.ensure_table()?;
        let (fragments, bindings) = self.core.compile_clauses();
        let sql = self.core.grammar.compile_select(
            &self.core.table,
            &self.columns,
            &fragments,
            self.distinct,
        );
        Ok(BuiltQuery { sql, bindings })
    }

    /// Compile the "total matching rows" companion query: the column list is
    /// replaced by a `COUNT(...)` expression and ORDER BY / LIMIT are
    /// stripped while JOIN, WHERE, GROUP BY and HAVING survive.
    pub fn build_count(&self, column: Option<&str>, distinct: bool) -> QueryResult<BuiltQuery> {
        self.core.check_build_error()?;
        self.core.ensure_table()?;

        let counted = match column {
            Some(column) => self.core.grammar.wrap_identifier(column),
            None => "*".to_string(),
        };
        let expression = if distinct {
            format!("{{COUNT(DISTINCT {}) AS total_count}}", counted)
        } else {
            format!("{{COUNT({}) AS total_count}}", counted)
        };

        let (fragments, bindings) = self
            .core
            .compile_clauses_filtered(|clause| {
                !matches!(clause, Clause::OrderBy(_) | Clause::Limit(_))
            });
        let sql = self.core.grammar.compile_select(
            &self.core.table,
            &[expression],
            &fragments,
            false,
        );
        Ok(BuiltQuery { sql, bindings })
    }

    fn executor(&self) -> QueryResult<&Arc<dyn Executor>> {
        self.executor.as_ref().ok_or(QueryError::MissingExecutor)
    }

    /// Run `built` through the executor, consulting the cache first when one
    /// is attached. The cache key is derived from prefix + SQL + bindings.
    async fn cached_rows(&self, prefix: &str, built: &BuiltQuery) -> QueryResult<Vec<Row>> {
        tracing::debug!(
            target: "sqlmason::sql",
            sql = %built.sql,
            bindings = built.bindings.len(),
            "executing select"
        );

        let Some(cache) = &self.cache else {
            return self.executor()?.fetch_all(&built.sql, &built.bindings).await;
        };

        let key = cache.make_key(prefix, &built.sql, &built.bindings)?;
        if let Some(value) = cache.get(&key).await {
            match serde_json::from_value::<Vec<Row>>(value) {
                Ok(rows) => return Ok(rows),
                Err(err) => tracing::warn!(
                    target: "sqlmason::cache",
                    error = %err,
                    "discarding undecodable cache entry"
                ),
            }
        }

        let rows = self.executor()?.fetch_all(&built.sql, &built.bindings).await?;
        match serde_json::to_value(&rows) {
            Ok(value) => cache.set(&key, value).await,
            Err(err) => tracing::warn!(
                target: "sqlmason::cache",
                error = %err,
                "skipping cache store for unserializable rows"
            ),
        }
        Ok(rows)
    }

    /// Fetch every matching row.
    pub async fn fetch_all(&self) -> QueryResult<Vec<Row>> {
        let built = self.build()?;
        self.cached_rows("all", &built).await
    }

    /// Fetch the first matching row, if any.
    pub async fn fetch_opt(&self) -> QueryResult<Option<Row>> {
        let built = self.build()?;
        let rows = self.cached_rows("one", &built).await?;
        Ok(rows.into_iter().next())
    }

    /// Fetch one column of the first matching row.
    pub async fn fetch_value(&self, column: &str) -> QueryResult<Option<serde_json::Value>> {
        let built = self.build()?;
        let rows = self.cached_rows("value", &built).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get(column).cloned()))
    }

    /// Fetch one column across all matching rows.
    pub async fn fetch_column(&self, column: &str) -> QueryResult<Vec<serde_json::Value>> {
        let built = self.build()?;
        let rows = self.cached_rows("column", &built).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get(column).cloned())
            .collect())
    }

    /// Total matching rows, sharing this builder's filters.
    pub async fn count(&self, column: Option<&str>, distinct: bool) -> QueryResult<i64> {
        let built = self.build_count(column, distinct)?;
        let rows = self.cached_rows("count", &built).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("total_count"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0))
    }

    /// Whether any row matches this builder's filters.
    pub async fn exists(&self) -> QueryResult<bool> {
        Ok(self.count(None, false).await? > 0)
    }
}

impl BuilderAccess for SelectBuilder {
    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }
}

impl WhereCapable for SelectBuilder {}
impl JoinCapable for SelectBuilder {}
impl GroupByCapable for SelectBuilder {}
impl HavingCapable for SelectBuilder {}
impl OrderByCapable for SelectBuilder {}
impl LimitCapable for SelectBuilder {}
impl WhenCapable for SelectBuilder {}

impl std::fmt::Debug for SelectBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectBuilder")
            .field("table", &self.core.table)
            .field("columns", &self.columns)
            .field("distinct", &self.distinct)
            .finish_non_exhaustive()
    }
}
