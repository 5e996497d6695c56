//! Connection pooling with liveness validation and bounded-backoff acquire.
//!
//! The pool is the only concurrency-sensitive piece of the crate: its
//! available/in-use accounting sits behind a mutex, acquire waits with
//! exponential backoff up to a hard timeout, and a connection is validated
//! before being handed out — dead connections are discarded, never returned.
//! [`PooledExecutor`] layers the [`Executor`] contract on top, pinning a
//! connection for the duration of an open transaction so no other caller can
//! interleave statements into it.

use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, Row};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// Pool sizing and timing parameters.
///
/// Validated at pool construction; out-of-range values are configuration
/// errors, never silently defaulted.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: usize,
    pub min_connections: usize,
    /// Idle connections older than this are pruned.
    pub max_idle: Duration,
    /// Hard ceiling on how long `acquire` may wait.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            max_idle: Duration::from_secs(3600),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> QueryResult<()> {
        if self.max_connections < 1 {
            return Err(QueryError::configuration(
                "max_connections must be at least 1",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(QueryError::configuration(
                "min_connections must not exceed max_connections",
            ));
        }
        if self.max_idle.is_zero() {
            return Err(QueryError::configuration("max_idle must be nonzero"));
        }
        if self.acquire_timeout.is_zero() {
            return Err(QueryError::configuration("acquire_timeout must be nonzero"));
        }
        Ok(())
    }
}

/// A live database connection produced by a [`ConnectFactory`].
///
/// Checked-out connections are exclusively owned, hence `&mut self`
/// throughout.
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug {
    async fn fetch_all(&mut self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>>;

    async fn execute(&mut self, sql: &str, bindings: &[Value]) -> QueryResult<u64>;

    async fn last_insert_id(&mut self) -> QueryResult<Option<i64>>;

    async fn begin(&mut self) -> QueryResult<()>;

    async fn commit(&mut self) -> QueryResult<()>;

    async fn roll_back(&mut self) -> QueryResult<()>;

    /// Liveness probe. A `false` answer means the connection is discarded.
    async fn ping(&mut self) -> bool;
}

/// Opens new connections for the pool.
#[async_trait]
pub trait ConnectFactory: Send + Sync {
    async fn connect(&self) -> QueryResult<Box<dyn Connection>>;
}

struct Idle {
    conn: Box<dyn Connection>,
    since: Instant,
}

struct PoolState {
    available: VecDeque<Idle>,
    in_use: usize,
    closed: bool,
}

enum AcquirePlan {
    Reuse(Box<dyn Connection>),
    Create,
    Wait,
}

/// Mutex-guarded connection pool with bounded wait-and-retry acquire.
pub struct ConnectionPool {
    factory: Arc<dyn ConnectFactory>,
    config: PoolConfig,
    state: Mutex<PoolState>,
}

impl ConnectionPool {
    /// Validate the configuration and warm up `min_connections` eagerly.
    /// Warm-up failures are logged and tolerated; acquire will retry.
    pub async fn new(factory: Arc<dyn ConnectFactory>, config: PoolConfig) -> QueryResult<Self> {
        config.validate()?;
        let pool = Self {
            factory,
            config,
            state: Mutex::new(PoolState {
                available: VecDeque::new(),
                in_use: 0,
                closed: false,
            }),
        };

        for _ in 0..pool.config.min_connections {
            match pool.factory.connect().await {
                Ok(conn) => {
                    let mut state = pool.state.lock().await;
                    state.available.push_back(Idle {
                        conn,
                        since: Instant::now(),
                    });
                }
                Err(err) => {
                    tracing::warn!(target: "sqlmason::pool", error = %err, "warm-up connect failed");
                    break;
                }
            }
        }

        Ok(pool)
    }

    /// Check a connection out.
    ///
    /// Reuses a live idle connection, creates a new one while under
    /// `max_connections`, and otherwise waits with exponential backoff
    /// (50ms, ×1.5, capped at 500ms) until `acquire_timeout` elapses.
    pub async fn acquire(&self) -> QueryResult<Box<dyn Connection>> {
        let started = Instant::now();
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let plan = {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(QueryError::PoolClosed);
                }
                Self::prune_expired(&mut state, self.config.max_idle);
                if let Some(idle) = state.available.pop_front() {
                    state.in_use += 1;
                    AcquirePlan::Reuse(idle.conn)
                } else if state.in_use < self.config.max_connections {
                    state.in_use += 1;
                    AcquirePlan::Create
                } else {
                    AcquirePlan::Wait
                }
            };

            match plan {
                AcquirePlan::Reuse(mut conn) => {
                    if conn.ping().await {
                        return Ok(conn);
                    }
                    tracing::warn!(target: "sqlmason::pool", "discarding dead idle connection");
                    self.state.lock().await.in_use -= 1;
                }
                AcquirePlan::Create => match self.factory.connect().await {
                    Ok(conn) => {
                        tracing::debug!(target: "sqlmason::pool", "opened new connection");
                        return Ok(conn);
                    }
                    Err(err) => {
                        self.state.lock().await.in_use -= 1;
                        return Err(err);
                    }
                },
                AcquirePlan::Wait => {
                    if started.elapsed() >= self.config.acquire_timeout {
                        return Err(QueryError::PoolTimeout(self.config.acquire_timeout));
                    }
                    sleep(backoff).await;
                    backoff = (backoff * 3 / 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    /// Return a connection. Dead connections are dropped; live ones rejoin
    /// the idle set. The pool then tops itself back up to `min_connections`.
    pub async fn release(&self, mut conn: Box<dyn Connection>) {
        let alive = conn.ping().await;
        {
            let mut state = self.state.lock().await;
            state.in_use = state.in_use.saturating_sub(1);
            if state.closed {
                return;
            }
            if alive {
                state.available.push_back(Idle {
                    conn,
                    since: Instant::now(),
                });
            } else {
                tracing::warn!(target: "sqlmason::pool", "dropping dead connection on release");
            }
        }
        self.maintain_min().await;
    }

    /// Close the pool: idle connections are dropped and further acquires
    /// fail with [`QueryError::PoolClosed`].
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.available.clear();
    }

    pub async fn idle_count(&self) -> usize {
        self.state.lock().await.available.len()
    }

    pub async fn active_count(&self) -> usize {
        self.state.lock().await.in_use
    }

    fn prune_expired(state: &mut PoolState, max_idle: Duration) {
        state.available.retain(|idle| idle.since.elapsed() <= max_idle);
    }

    async fn maintain_min(&self) {
        loop {
            {
                let state = self.state.lock().await;
                if state.closed || state.available.len() + state.in_use >= self.config.min_connections
                {
                    return;
                }
            }
            match self.factory.connect().await {
                Ok(conn) => {
                    let mut state = self.state.lock().await;
                    state.available.push_back(Idle {
                        conn,
                        since: Instant::now(),
                    });
                }
                Err(err) => {
                    tracing::warn!(target: "sqlmason::pool", error = %err, "min-connection top-up failed");
                    return;
                }
            }
        }
    }
}

/// [`Executor`] implementation over a [`ConnectionPool`].
///
/// Outside a transaction every operation checks a connection out and returns
/// it afterwards. `begin_transaction` pins one connection that is not
/// returned to the pool until `commit` or `roll_back`, so the transaction's
/// statements cannot interleave with another caller's.
pub struct PooledExecutor {
    pool: Arc<ConnectionPool>,
    pinned: Mutex<Option<Box<dyn Connection>>>,
    last_id: Mutex<Option<i64>>,
}

impl PooledExecutor {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            pinned: Mutex::new(None),
            last_id: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

#[async_trait]
impl Executor for PooledExecutor {
    async fn fetch_all(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        let mut pinned = self.pinned.lock().await;
        if let Some(conn) = pinned.as_mut() {
            return conn.fetch_all(sql, bindings).await;
        }
        drop(pinned);

        let mut conn = self.pool.acquire().await?;
        let result = conn.fetch_all(sql, bindings).await;
        self.pool.release(conn).await;
        result
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        let mut pinned = self.pinned.lock().await;
        if let Some(conn) = pinned.as_mut() {
            let affected = conn.execute(sql, bindings).await?;
            *self.last_id.lock().await = conn.last_insert_id().await.unwrap_or(None);
            return Ok(affected);
        }
        drop(pinned);

        let mut conn = self.pool.acquire().await?;
        let result = conn.execute(sql, bindings).await;
        if result.is_ok() {
            if let Ok(id) = conn.last_insert_id().await {
                *self.last_id.lock().await = id;
            }
        }
        self.pool.release(conn).await;
        result
    }

    async fn last_insert_id(&self) -> QueryResult<Option<i64>> {
        Ok(*self.last_id.lock().await)
    }

    async fn begin_transaction(&self) -> QueryResult<()> {
        let mut pinned = self.pinned.lock().await;
        if pinned.is_some() {
            return Err(QueryError::driver(
                "a transaction is already open on this executor",
            ));
        }
        let mut conn = self.pool.acquire().await?;
        if let Err(err) = conn.begin().await {
            self.pool.release(conn).await;
            return Err(err);
        }
        *pinned = Some(conn);
        Ok(())
    }

    async fn commit(&self) -> QueryResult<()> {
        let mut pinned = self.pinned.lock().await;
        match pinned.take() {
            Some(mut conn) => {
                let result = conn.commit().await;
                self.pool.release(conn).await;
                result
            }
            None => Err(QueryError::driver("no open transaction to commit")),
        }
    }

    async fn roll_back(&self) -> QueryResult<()> {
        let mut pinned = self.pinned.lock().await;
        match pinned.take() {
            Some(mut conn) => {
                let result = conn.roll_back().await;
                self.pool.release(conn).await;
                result
            }
            None => Err(QueryError::driver("no open transaction to roll back")),
        }
    }

    async fn in_transaction(&self) -> bool {
        self.pinned.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeConnection {
        alive: Arc<AtomicBool>,
        executed: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Connection for FakeConnection {
        async fn fetch_all(&mut self, _sql: &str, _bindings: &[Value]) -> QueryResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute(&mut self, sql: &str, _bindings: &[Value]) -> QueryResult<u64> {
            self.executed.lock().await.push(sql.to_string());
            Ok(1)
        }

        async fn last_insert_id(&mut self) -> QueryResult<Option<i64>> {
            Ok(Some(7))
        }

        async fn begin(&mut self) -> QueryResult<()> {
            self.executed.lock().await.push("BEGIN".to_string());
            Ok(())
        }

        async fn commit(&mut self) -> QueryResult<()> {
            self.executed.lock().await.push("COMMIT".to_string());
            Ok(())
        }

        async fn roll_back(&mut self) -> QueryResult<()> {
            self.executed.lock().await.push("ROLLBACK".to_string());
            Ok(())
        }

        async fn ping(&mut self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }

    struct FakeFactory {
        connects: AtomicUsize,
        alive: Arc<AtomicBool>,
        executed: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFactory {
        fn new() -> Self {
            Self {
                connects: AtomicUsize::new(0),
                alive: Arc::new(AtomicBool::new(true)),
                executed: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ConnectFactory for FakeFactory {
        async fn connect(&self) -> QueryResult<Box<dyn Connection>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeConnection {
                alive: self.alive.clone(),
                executed: self.executed.clone(),
            }))
        }
    }

    fn tight_config() -> PoolConfig {
        PoolConfig {
            max_connections: 1,
            min_connections: 0,
            max_idle: Duration::from_secs(60),
            acquire_timeout: Duration::from_millis(150),
        }
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        let bad = PoolConfig {
            max_connections: 0,
            ..PoolConfig::default()
        };
        assert!(bad.validate().unwrap_err().is_configuration());

        let bad = PoolConfig {
            min_connections: 11,
            max_connections: 10,
            ..PoolConfig::default()
        };
        assert!(bad.validate().unwrap_err().is_configuration());

        let bad = PoolConfig {
            acquire_timeout: Duration::ZERO,
            ..PoolConfig::default()
        };
        assert!(bad.validate().unwrap_err().is_configuration());
    }

    #[tokio::test]
    async fn acquire_times_out_when_exhausted() {
        let factory = Arc::new(FakeFactory::new());
        let pool = ConnectionPool::new(factory, tight_config()).await.unwrap();

        let held = pool.acquire().await.unwrap();
        let err = pool.acquire().await.unwrap_err();
        assert!(err.is_timeout());
        pool.release(held).await;
    }

    #[tokio::test]
    async fn released_connections_are_reused() {
        let factory = Arc::new(FakeFactory::new());
        let pool = ConnectionPool::new(factory.clone(), tight_config())
            .await
            .unwrap();

        let conn = pool.acquire().await.unwrap();
        pool.release(conn).await;
        let conn = pool.acquire().await.unwrap();
        pool.release(conn).await;

        assert_eq!(factory.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dead_idle_connections_are_discarded() {
        let factory = Arc::new(FakeFactory::new());
        let pool = ConnectionPool::new(factory.clone(), tight_config())
            .await
            .unwrap();

        let conn = pool.acquire().await.unwrap();
        pool.release(conn).await;
        assert_eq!(pool.idle_count().await, 1);

        // The idle connection dies; the same acquire call must discard it
        // and open a fresh one.
        factory.alive.store(false, Ordering::SeqCst);
        let replacement = pool.acquire().await;
        factory.alive.store(true, Ordering::SeqCst);
        assert!(replacement.is_ok());
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn closed_pool_rejects_acquire() {
        let factory = Arc::new(FakeFactory::new());
        let pool = ConnectionPool::new(factory, tight_config()).await.unwrap();
        pool.close().await;
        assert!(matches!(
            pool.acquire().await.unwrap_err(),
            QueryError::PoolClosed
        ));
    }

    #[tokio::test]
    async fn warm_up_opens_min_connections() {
        let factory = Arc::new(FakeFactory::new());
        let config = PoolConfig {
            min_connections: 2,
            max_connections: 4,
            ..PoolConfig::default()
        };
        let pool = ConnectionPool::new(factory.clone(), config).await.unwrap();
        assert_eq!(pool.idle_count().await, 2);
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transaction_pins_connection_until_commit() {
        let factory = Arc::new(FakeFactory::new());
        let pool = Arc::new(
            ConnectionPool::new(factory.clone(), tight_config())
                .await
                .unwrap(),
        );
        let executor = PooledExecutor::new(pool.clone());

        executor.begin_transaction().await.unwrap();
        assert!(executor.in_transaction().await);
        assert_eq!(pool.idle_count().await, 0);

        executor.execute("UPDATE t SET a = ?", &[Value::Int(1)]).await.unwrap();
        executor.commit().await.unwrap();

        assert!(!executor.in_transaction().await);
        assert_eq!(pool.idle_count().await, 1);
        // The whole transaction ran on one connection.
        assert_eq!(factory.connects.load(Ordering::SeqCst), 1);
        let log = factory.executed.lock().await.clone();
        assert_eq!(log, vec!["BEGIN", "UPDATE t SET a = ?", "COMMIT"]);
    }

    #[tokio::test]
    async fn rollback_releases_pinned_connection() {
        let factory = Arc::new(FakeFactory::new());
        let pool = Arc::new(
            ConnectionPool::new(factory.clone(), tight_config())
                .await
                .unwrap(),
        );
        let executor = PooledExecutor::new(pool.clone());

        executor.begin_transaction().await.unwrap();
        executor.roll_back().await.unwrap();
        assert!(!executor.in_transaction().await);
        assert_eq!(pool.idle_count().await, 1);
    }

    #[tokio::test]
    async fn last_insert_id_survives_connection_release() {
        let factory = Arc::new(FakeFactory::new());
        let pool = Arc::new(
            ConnectionPool::new(factory, tight_config()).await.unwrap(),
        );
        let executor = PooledExecutor::new(pool);

        executor
            .execute("INSERT INTO t (a) VALUES (?)", &[Value::Int(1)])
            .await
            .unwrap();
        assert_eq!(executor.last_insert_id().await.unwrap(), Some(7));
    }
}
