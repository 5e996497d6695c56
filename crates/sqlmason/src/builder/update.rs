//! UPDATE statement builder.

use super::capability::{BuilderAccess, JoinCapable, WhenCapable, WhereCapable};
use super::{BuilderCore, BuiltQuery};
use crate::clause::{Clause, ClausePriority, SetClause};
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::grammar::Grammar;
use crate::value::Arg;
use std::sync::Arc;

/// Fluent UPDATE builder.
///
/// Compiles to `UPDATE table [JOIN ...] SET ... [WHERE ...]`. Re-invoking
/// `set()` on a column overwrites the prior value (last-write-wins) and the
/// whole SET clause is regenerated, never duplicated.
#[derive(Clone)]
pub struct UpdateBuilder {
    core: BuilderCore,
    assignments: Vec<(String, Arg)>,
    executor: Option<Arc<dyn Executor>>,
}

impl UpdateBuilder {
    pub fn new(table: &str, grammar: Grammar) -> Self {
        Self {
            core: BuilderCore::new(table, grammar),
            assignments: Vec::new(),
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

    /// Assign a value to a column. [`Arg::Raw`] values (or `{...}`-tagged
    /// strings) emit verbatim with no binding.
    pub fn set(mut self, column: &str, value: impl Into<Arg>) -> Self {
        let value = value.into();
        match self
            .assignments
            .iter_mut()
            .find(|(existing, _)| existing == column)
        {
            Some((_, slot)) => *slot = value,
            None => self.assignments.push((column.to_string(), value)),
        }
        let clause = SetClause::new(self.assignments.clone());
        self.core
            .replace_clause(Clause::Set(clause), ClausePriority::Set);
        self
    }

    /// Assign several columns at once.
    pub fn set_many(mut self, pairs: Vec<(String, Arg)>) -> Self {
        for (column, value) in pairs {
            self = self.set(&column, value);
        }
        self
    }

    /// Compile to SQL plus ordered bindings (SET assignments first, then
    /// WHERE).
    pub fn build(&self) -> QueryResult<BuiltQuery> {
        self.core.check_build_error()?;
        self.core.ensure_table()?;
        if self.assignments.is_empty() {
            return Err(QueryError::configuration(
                "UPDATE requires at least one SET assignment",
            ));
        }
        let (fragments, bindings) = self.core.compile_clauses();
        let sql = self
            .core
            .grammar
            .compile_update(&self.core.table, &fragments);
        Ok(BuiltQuery { sql, bindings })
    }

    /// Execute and return the affected row count.
    pub async fn execute(&self) -> QueryResult<u64> {
        let built = self.build()?;
        tracing::debug!(
            target: "sqlmason::sql",
            sql = %built.sql,
            bindings = built.bindings.len(),
            "executing update"
        );
        let executor = self.executor.as_ref().ok_or(QueryError::MissingExecutor)?;
        executor.execute(&built.sql, &built.bindings).await
    }
}

impl BuilderAccess for UpdateBuilder {
    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }
}

impl WhereCapable for UpdateBuilder {}
impl JoinCapable for UpdateBuilder {}
impl WhenCapable for UpdateBuilder {}

impl std::fmt::Debug for UpdateBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateBuilder")
            .field("table", &self.core.table)
            .field("assignments", &self.assignments.len())
            .finish_non_exhaustive()
    }
}
