//! Query session: one dialect, one executor, optional result cache.

use crate::builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::cache::{Cache, CacheConfig, CacheManager};
use crate::compiler::SqlCompiler;
use crate::error::QueryResult;
use crate::executor::Executor;
use crate::grammar::{Dialect, Grammar};
use std::sync::Arc;

/// Entry point tying a dialect grammar to an executor and optional cache.
///
/// Builders handed out by a session carry the session's grammar, executor
/// and cache manager; the session itself only passes transactions through to
/// the executor.
#[derive(Clone)]
pub struct QuerySession {
    grammar: Grammar,
    executor: Arc<dyn Executor>,
    cache: Option<CacheManager>,
}

impl QuerySession {
    pub fn new(dialect: Dialect, executor: Arc<dyn Executor>) -> Self {
        Self {
            grammar: Grammar::new(dialect),
            executor,
            cache: None,
        }
    }

    /// Dialect looked up by name (`mysql`, `postgres`, `sqlite3`, ...);
    /// unrecognized names fail fatally.
    pub fn for_dialect(name: &str, executor: Arc<dyn Executor>) -> QueryResult<Self> {
        Ok(Self::new(Dialect::from_name(name)?, executor))
    }

    /// Enable result caching for builders created by this session.
    pub fn with_cache(mut self, cache: Arc<dyn Cache>, config: CacheConfig) -> Self {
        self.cache = Some(CacheManager::new(cache, config));
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn compiler(&self) -> SqlCompiler {
        SqlCompiler::new(self.grammar)
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Start a SELECT with a column list; the table comes from `.from()`.
    pub fn select(&self, columns: &[&str]) -> SelectBuilder {
        SelectBuilder::with_runtime(
            "",
            self.grammar,
            Some(self.executor.clone()),
            self.cache.clone(),
        )
        .select(columns)
    }

    /// Start a SELECT against a table.
    pub fn from(&self, table: &str) -> SelectBuilder {
        SelectBuilder::with_runtime(
            table,
            self.grammar,
            Some(self.executor.clone()),
            self.cache.clone(),
        )
    }

    pub fn insert(&self, table: &str) -> InsertBuilder {
        InsertBuilder::with_runtime(table, self.grammar, Some(self.executor.clone()))
    }

    pub fn update(&self, table: &str) -> UpdateBuilder {
        UpdateBuilder::with_runtime(table, self.grammar, Some(self.executor.clone()))
    }

    pub fn delete(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::with_runtime(table, self.grammar, Some(self.executor.clone()))
    }

    pub async fn begin_transaction(&self) -> QueryResult<()> {
        tracing::debug!(target: "sqlmason::session", "begin transaction");
        self.executor.begin_transaction().await
    }

    pub async fn commit(&self) -> QueryResult<()> {
        tracing::debug!(target: "sqlmason::session", "commit transaction");
        self.executor.commit().await
    }

    pub async fn roll_back(&self) -> QueryResult<()> {
        tracing::debug!(target: "sqlmason::session", "roll back transaction");
        self.executor.roll_back().await
    }

    pub async fn in_transaction(&self) -> bool {
        self.executor.in_transaction().await
    }
}

impl std::fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySession")
            .field("dialect", &self.grammar.dialect())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
