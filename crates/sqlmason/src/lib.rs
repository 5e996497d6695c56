//! # sqlmason
//!
//! A fluent, multi-dialect SQL statement builder.
//!
//! Statements are composed through chained method calls and compile to a
//! parameterized SQL string plus an ordered list of bind values, ready for a
//! database driver. A small connection pool and a get-or-compute result
//! cache wrap the driver boundary.
//!
//! ## Features
//!
//! - **Clause model**: every clause compiles independently and carries its
//!   own bindings, assembled in fixed priority order
//! - **Condition trees**: WHERE/HAVING with AND/OR glue and nested groups
//! - **Dialects**: MySQL, PostgreSQL and SQLite identifier quoting behind a
//!   single `?`-placeholder surface
//! - **Raw escape hatch**: `{...}`-tagged strings and [`Arg::Raw`] emit
//!   verbatim SQL with no quoting and no placeholder
//! - **Pool + cache**: mutex-guarded pool with liveness checks and bounded
//!   backoff; result caching keyed by `sha256(sql + bindings)`
//!
//! ## Building statements
//!
//! ```ignore
//! use sqlmason::{Dialect, Grammar, SelectBuilder};
//! use sqlmason::{LimitCapable, OrderByCapable, WhereCapable};
//!
//! let built = SelectBuilder::new("users", Grammar::mysql())
//!     .select(&["id", "name"])
//!     .where_("status = ?", ("active",))
//!     .order_by("id", "asc")
//!     .limit(5)
//!     .build()?;
//!
//! assert_eq!(
//!     built.sql,
//!     "SELECT `id`, `name` FROM `users` WHERE status = ? ORDER BY `id` ASC LIMIT 5"
//! );
//! # Ok::<(), sqlmason::QueryError>(())
//! ```
//!
//! ## Executing through a session
//!
//! ```ignore
//! use sqlmason::{QuerySession, WhereCapable};
//!
//! let session = QuerySession::for_dialect("mysql", executor)?;
//! let rows = session
//!     .from("users")
//!     .where_("status = ?", ("active",))
//!     .fetch_all()
//!     .await?;
//! ```

pub mod builder;
pub mod cache;
pub mod clause;
pub mod compiler;
pub mod condition;
pub mod error;
pub mod executor;
pub mod grammar;
pub mod ident;
pub mod pool;
pub mod prelude;
pub mod raw;
pub mod session;
pub mod value;

pub use builder::{
    BuiltQuery, DeleteBuilder, GroupByCapable, HavingCapable, InsertBuilder, JoinCapable,
    LimitCapable, OrderByCapable, SelectBuilder, UpdateBuilder, WhenCapable, WhereCapable,
};
pub use cache::{Cache, CacheConfig, CacheManager, MemoryCache};
pub use clause::{Clause, ClausePriority, JoinKind, OrderDirection};
pub use compiler::{BuildSql, SqlCompiler};
pub use condition::{ConditionBuilder, Glue};
pub use error::{QueryError, QueryResult};
pub use executor::{Executor, Row};
pub use grammar::{Dialect, Grammar};
pub use ident::TableIdent;
pub use pool::{ConnectFactory, Connection, ConnectionPool, PoolConfig, PooledExecutor};
pub use raw::{Raw, raw};
pub use session::QuerySession;
pub use value::{Arg, IntoBindings, Value};
