//! INSERT statement builder.

use super::capability::{BuilderAccess, WhenCapable};
use super::{BuilderCore, BuiltQuery};
use crate::clause::{Clause, ClausePriority, ValuesClause};
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::grammar::Grammar;
use crate::value::Value;
use std::sync::Arc;

/// Fluent INSERT builder.
///
/// Rows are ordered `(column, value)` pairs; every row must carry exactly
/// the first row's column names, in the same order. A mismatch is a fatal
/// shape error and the offending row is rejected without touching the rows
/// already accumulated.
#[derive(Clone)]
pub struct InsertBuilder {
    core: BuilderCore,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    executor: Option<Arc<dyn Executor>>,
}

impl InsertBuilder {
    pub fn new(table: &str, grammar: Grammar) -> Self {
        Self {
            core: BuilderCore::new(table, grammar),
            columns: Vec::new(),
            rows: Vec::new(),
            executor: None,
        }
    }

    pub(crate) fn with_runtime(
        table: &str,
        grammar: Grammar,
        executor: Option<Arc<dyn Executor>>,
    ) -> Self {
        Self {
            executor,
            ..Self::new(table, grammar)
        }
    }

    /// Append one row. The first row fixes the column set and order for the
    /// whole statement.
    pub fn values(mut self, row: Vec<(String, Value)>) -> QueryResult<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Append several rows; rejected at the first shape mismatch.
    pub fn values_many(mut self, rows: Vec<Vec<(String, Value)>>) -> QueryResult<Self> {
        for row in rows {
            self.push_row(row)?;
        }
        Ok(self)
    }

    fn push_row(&mut self, row: Vec<(String, Value)>) -> QueryResult<()> {
        let (columns, values): (Vec<String>, Vec<Value>) = row.into_iter().unzip();

        if self.columns.is_empty() {
            self.columns = columns;
        } else if columns != self.columns {
            return Err(QueryError::shape_mismatch(format!(
                "columns of all rows must match: expected [{}], got [{}]",
                self.columns.join(", "),
                columns.join(", ")
            )));
        }

        self.rows.push(values);
        self.core.replace_clause(
            Clause::Values(ValuesClause::new(self.columns.clone(), self.rows.clone())),
            ClausePriority::Values,
        );
        Ok(())
    }

    /// Compile to `INSERT INTO table (cols) VALUES (...), (...)` with
    /// bindings flattened row-major.
    pub fn build(&self) -> QueryResult<BuiltQuery> {
        self.core.check_build_error()?;
        self.core.ensure_table()?;
        if self.rows.is_empty() {
            return Err(QueryError::configuration(
                "INSERT requires at least one VALUES row",
            ));
        }
        let (fragments, bindings) = self.core.compile_clauses();
        let sql = self
            .core
            .grammar
            .compile_insert(&self.core.table, &fragments);
        Ok(BuiltQuery { sql, bindings })
    }

    fn executor(&self) -> QueryResult<&Arc<dyn Executor>> {
        self.executor.as_ref().ok_or(QueryError::MissingExecutor)
    }

    /// Execute and return the affected row count.
    pub async fn execute(&self) -> QueryResult<u64> {
        let built = self.build()?;
        tracing::debug!(
            target: "sqlmason::sql",
            sql = %built.sql,
            bindings = built.bindings.len(),
            "executing insert"
        );
        self.executor()?.execute(&built.sql, &built.bindings).await
    }

    /// Execute and return the driver-reported auto-increment id, if any.
    pub async fn insert_get_id(&self) -> QueryResult<Option<i64>> {
        self.execute().await?;
        self.executor()?.last_insert_id().await
    }
}

impl BuilderAccess for InsertBuilder {
    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }
}

impl WhenCapable for InsertBuilder {}

impl std::fmt::Debug for InsertBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertBuilder")
            .field("table", &self.core.table)
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}
