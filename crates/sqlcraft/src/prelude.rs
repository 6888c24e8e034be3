//! Convenient imports for typical `sqlcraft` usage.
//!
//! ```ignore
//! use sqlcraft::prelude::*;
//! ```

pub use crate::{
    Cardinality, Dialect, EntityRow, FromRow, FromValue, MySql, OrmError, OrmResult, Postgres,
    Query, Row, SchemaRegistry, SqlConfig, Sqlite, Statement, TableMeta, ToValue, Transport, Value,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
