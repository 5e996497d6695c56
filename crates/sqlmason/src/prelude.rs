//! Convenient imports for typical `sqlmason` usage.
//!
//! ```ignore
//! use sqlmason::prelude::*;
//! ```

pub use crate::builder::{
    BuiltQuery, DeleteBuilder, GroupByCapable, HavingCapable, InsertBuilder, JoinCapable,
    LimitCapable, OrderByCapable, SelectBuilder, UpdateBuilder, WhenCapable, WhereCapable,
};
pub use crate::cache::{Cache, CacheConfig, MemoryCache};
pub use crate::error::{QueryError, QueryResult};
pub use crate::executor::{Executor, Row};
pub use crate::grammar::{Dialect, Grammar};
pub use crate::pool::{ConnectFactory, Connection, ConnectionPool, PoolConfig, PooledExecutor};
pub use crate::raw::{Raw, raw};
pub use crate::session::QuerySession;
pub use crate::value::{Arg, IntoBindings, Value};
