//! DELETE statement builder.

use super::capability::{BuilderAccess, JoinCapable, WhenCapable, WhereCapable};
use super::{BuilderCore, BuiltQuery};
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::grammar::Grammar;
use std::sync::Arc;

/// Fluent DELETE builder: `DELETE FROM table [JOIN ...] [WHERE ...]`.
#[derive(Clone)]
pub struct DeleteBuilder {
    core: BuilderCore,
    executor: Option<Arc<dyn Executor>>,
}

impl DeleteBuilder {
    pub fn new(table: &str, grammar: Grammar) -> Self {
        Self {
            core: BuilderCore::new(table, grammar),
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

    /// Compile to SQL plus ordered bindings.
    pub fn build(&self) -> QueryResult<BuiltQuery> {
        self.core.check_build_error()?;
        self.core.ensure_table()?;
        let (fragments, bindings) = self.core.compile_clauses();
        let sql = self
            .core
            .grammar
            .compile_delete(&self.core.table, &fragments);
        Ok(BuiltQuery { sql, bindings })
    }

    /// Execute and return the affected row count.
    pub async fn execute(&self) -> QueryResult<u64> {
        let built = self.build()?;
        tracing::debug!(
            target: "sqlmason::sql",
            sql = %built.sql,
            bindings = built.bindings.len(),
            "executing delete"
        );
        let executor = self.executor.as_ref().ok_or(QueryError::MissingExecutor)?;
        executor.execute(&built.sql, &built.bindings).await
    }
}

impl BuilderAccess for DeleteBuilder {
    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }
}

impl WhereCapable for DeleteBuilder {}
impl JoinCapable for DeleteBuilder {}
impl WhenCapable for DeleteBuilder {}

impl std::fmt::Debug for DeleteBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteBuilder")
            .field("table", &self.core.table)
            .finish_non_exhaustive()
    }
}
