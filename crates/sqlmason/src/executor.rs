//! The driver execution boundary.
//!
//! The core only ever hands implementations a fully compiled SQL string and
//! an ordered bindings array, and treats returned rows as opaque mappings.

use crate::error::QueryResult;
use crate::value::Value;
use async_trait::async_trait;

/// An opaque result row: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Async driver boundary consumed by builders, sessions and the pool layer.
///
/// Driver adapters implement this outside the crate; [`PooledExecutor`]
/// (crate::pool) implements it over a connection pool.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a query and return every row.
    async fn fetch_all(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>>;

    /// Run a statement and return the affected row count.
    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64>;

    /// The auto-increment id produced by the most recent `execute`, if the
    /// driver reports one.
    async fn last_insert_id(&self) -> QueryResult<Option<i64>>;

    async fn begin_transaction(&self) -> QueryResult<()>;

    async fn commit(&self) -> QueryResult<()>;

    async fn roll_back(&self) -> QueryResult<()>;

    async fn in_transaction(&self) -> bool;

    /// First row of the result set, if any.
    async fn fetch_opt(&self, sql: &str, bindings: &[Value]) -> QueryResult<Option<Row>> {
        Ok(self.fetch_all(sql, bindings).await?.into_iter().next())
    }
}
