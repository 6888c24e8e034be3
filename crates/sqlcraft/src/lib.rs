//! # sqlcraft
//!
//! Fluent, dialect-aware SQL text generation with a small execution bridge.
//!
//! ## Features
//!
//! - **Ordered clauses**: a [`Statement`] tracks which clause it is in and
//!   rejects out-of-order calls with [`OrmError::ProtocolViolation`]
//! - **Literal rendering**: values are escaped into the text per [`Dialect`]
//!   (MySQL, SQLite, Postgres), so the output is a complete statement
//! - **Batches**: several commands in one statement, separated by the
//!   dialect's separator
//! - **Derived queries**: [`Statement::to_count`] and [`Statement::to_delete`]
//! - **Entities**: table and column mappings through a [`SchemaResolver`]
//! - **Typed protocol**: [`Query`] moves clause ordering to compile time
//! - **Execution**: run against any [`Transport`] with row-count policies
//!   ([`Cardinality`]); `tokio-postgres` and `deadpool-postgres` are built in
//!
//! ## Building
//!
//! ```ignore
//! use sqlcraft::prelude::*;
//!
//! let mut q = Statement::new(Sqlite);
//! q.select("id")?.select("name")?.from("users")?;
//! q.where_or_group()?;
//! q.where_col("role")?.eq("admin")?;
//! q.where_col("role")?.eq("owner")?;
//! q.end_where_or_group()?;
//! q.order_by("name")?;
//!
//! let total: i64 = q.to_count()?.fetch_scalar_one(&client).await?;
//! let page: Vec<(i64, String)> = q.fetch_all_as(&client).await?;
//! ```
//!
//! ## Batches
//!
//! ```ignore
//! let mut q = Statement::new(MySql);
//! q.insert("users", &["name"])?.values(&[&"alice"])?;
//! q.new_command()?;
//! q.select_last_insert_id()?;
//!
//! let id: u64 = q.fetch_scalar_one(&client).await?;
//! ```

pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod escape;
pub mod exec;
pub mod row;
pub mod schema;
pub mod statement;
pub mod typed;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg;

#[cfg(feature = "pool")]
pub mod pool;

pub mod prelude;

pub use client::{BufferedCursor, Column, FieldType, ResultSet, RowCursor, RowSource, Transport};
pub use config::SqlConfig;
pub use dialect::{Dialect, MySql, Postgres, Sqlite};
pub use error::{CardinalityViolation, OrmError, OrmResult};
pub use exec::{Cardinality, ExecSummary, ResultSetInfo, StatementKind};
pub use row::{FromRow, FromValue, Row};
pub use schema::{
    ColumnDef, EntityDescriptor, EntityRow, SchemaRegistry, SchemaResolver, TableMeta,
};
pub use statement::{CompareOp, JoinKind, Operand, State, Statement};
pub use typed::Query;
pub use value::{TableRef, ToValue, Value};

#[cfg(feature = "pool")]
pub use pool::{
    create_pool, create_pool_from_env, create_pool_with_config, create_pool_with_manager_config,
    create_pool_with_tls,
};
