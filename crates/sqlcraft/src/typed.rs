//! Compile-time clause ordering on top of [`Statement`].
//!
//! [`Query<S>`] carries a zero-sized marker for the clause it is in and only
//! offers the transitions legal from there, so most out-of-order calls are
//! type errors instead of [`OrmError::ProtocolViolation`]s. Every transition
//! still goes through the runtime [`Statement`], which stays authoritative.
//!
//! ```ignore
//! let q = Query::new(MySql)
//!     .select("id")?
//!     .from("users")?
//!     .where_col("age")?
//!     .ge(18)?
//!     .order_by("name")?
//!     .limit(10)?;
//! assert_eq!(q.as_str(), "SELECT `id` FROM `users` WHERE (`age`>=18) ORDER BY `name` LIMIT 10");
//! ```
//!
//! Comparing without a pending `WHERE` column does not compile:
//!
//! ```compile_fail
//! use sqlcraft::{dialect::MySql, typed::Query};
//!
//! let q = Query::new(MySql).select("a").unwrap().from("t").unwrap();
//! let _ = q.eq(1);
//! ```
//!
//! [`OrmError::ProtocolViolation`]: crate::OrmError::ProtocolViolation

use crate::config::SqlConfig;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::statement::{JoinKind, Statement};
use crate::value::ToValue;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

mod sealed {
    pub trait Sealed {}
}

/// Marker for a clause position of a [`Query`].
pub trait QueryState: sealed::Sealed {}

macro_rules! markers {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug)]
            pub enum $name {}
            impl sealed::Sealed for $name {}
            impl QueryState for $name {}
        )*
    };
}

markers! {
    /// Nothing written yet.
    Empty,
    /// Inside the select list.
    Selecting,
    /// Source known (after `FROM` or a join's `ON`).
    Sourced,
    /// Join source written, waiting for `ON`.
    Joining,
    /// Inside `WHERE` with every condition complete.
    Filtering,
    /// A `WHERE` column waits for its comparison.
    Comparing,
    /// Insert head written.
    Inserting,
    /// At least one `VALUES` row written.
    Valued,
    /// `UPDATE <table>` written.
    Updating,
    /// Inside `SET`.
    Setting,
    /// `DELETE FROM <table>` written.
    Deleting,
    /// Inside `ORDER BY`.
    Ordering,
    /// Only rendering and execution remain.
    Finished,
}

/// A [`Statement`] whose clause position is tracked in its type.
///
/// Dereferences to the inner statement for read-only access (rendering,
/// execution).
#[must_use]
pub struct Query<S: QueryState> {
    stmt: Statement,
    _state: PhantomData<S>,
}

impl<S: QueryState> Clone for Query<S> {
    fn clone(&self) -> Self {
        Self {
            stmt: self.stmt.clone(),
            _state: PhantomData,
        }
    }
}

impl<S: QueryState> fmt::Debug for Query<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("state", &std::any::type_name::<S>())
            .field("sql", &self.stmt.as_str())
            .finish()
    }
}

impl<S: QueryState> fmt::Display for Query<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stmt.as_str())
    }
}

impl<S: QueryState> Deref for Query<S> {
    type Target = Statement;

    fn deref(&self) -> &Statement {
        &self.stmt
    }
}

impl<S: QueryState> Query<S> {
    fn step<N: QueryState>(
        mut self,
        apply: impl FnOnce(&mut Statement) -> OrmResult<&mut Statement>,
    ) -> OrmResult<Query<N>> {
        apply(&mut self.stmt)?;
        Ok(Query {
            stmt: self.stmt,
            _state: PhantomData,
        })
    }

    /// Leave the typed layer.
    pub fn into_statement(self) -> Statement {
        self.stmt
    }
}

impl Query<Empty> {
    /// Empty query for `dialect`.
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self::from_statement(Statement::new(dialect))
    }

    /// Empty query sharing `config`.
    pub fn with_config(config: &SqlConfig) -> Self {
        Self::from_statement(Statement::with_config(config))
    }

    fn from_statement(stmt: Statement) -> Self {
        Self {
            stmt,
            _state: PhantomData,
        }
    }

    pub fn select(self, expr: &str) -> OrmResult<Query<Selecting>> {
        self.step(|s| s.select(expr))
    }

    pub fn select_all<T: 'static>(self) -> OrmResult<Query<Selecting>> {
        self.step(|s| s.select_all::<T>())
    }

    pub fn insert(self, table: &str, columns: &[&str]) -> OrmResult<Query<Inserting>> {
        self.step(|s| s.insert(table, columns))
    }

    pub fn insert_ignore(self, table: &str, columns: &[&str]) -> OrmResult<Query<Inserting>> {
        self.step(|s| s.insert_ignore(table, columns))
    }

    pub fn update(self, table: &str) -> OrmResult<Query<Updating>> {
        self.step(|s| s.update(table))
    }

    pub fn delete(self, table: &str) -> OrmResult<Query<Deleting>> {
        self.step(|s| s.delete(table))
    }
}

impl Query<Selecting> {
    pub fn select(self, expr: &str) -> OrmResult<Self> {
        self.step(|s| s.select(expr))
    }

    pub fn select_as(self, expr: &str, alias: &str) -> OrmResult<Self> {
        self.step(|s| s.select_as(expr, alias))
    }

    pub fn from(self, table: &str) -> OrmResult<Query<Sourced>> {
        self.step(|s| s.from(table))
    }

    pub fn from_as(self, table: &str, alias: &str) -> OrmResult<Query<Sourced>> {
        self.step(|s| s.from_as(table, alias))
    }

    /// `FROM` the entity bound by `select_all`.
    pub fn from_entity<T: 'static>(self, alias: Option<&str>) -> OrmResult<Query<Sourced>> {
        self.step(|s| s.from_entity::<T>(alias))
    }
}

impl Query<Sourced> {
    pub fn join(self, kind: JoinKind, table: &str, alias: Option<&str>) -> OrmResult<Query<Joining>> {
        self.step(|s| s.join(kind, table, alias))
    }
}

macro_rules! impl_to_count {
    ($($state:ty),*) => {
        $(
            impl Query<$state> {
                /// Derived statement counting the rows this query selects.
                pub fn to_count(&self) -> OrmResult<Self> {
                    Ok(Query {
                        stmt: self.stmt.to_count()?,
                        _state: PhantomData,
                    })
                }
            }
        )*
    };
}

impl_to_count!(Sourced, Filtering, Ordering, Finished);

macro_rules! impl_to_delete {
    ($($state:ty),*) => {
        $(
            impl Query<$state> {
                /// Derived statement deleting the rows this query selects.
                pub fn to_delete(&self) -> OrmResult<Query<Deleting>> {
                    Ok(Query {
                        stmt: self.stmt.to_delete()?,
                        _state: PhantomData,
                    })
                }
            }
        )*
    };
}

impl_to_delete!(Sourced, Filtering);

impl Query<Joining> {
    pub fn on(self, left: &str, right: &str) -> OrmResult<Query<Sourced>> {
        self.step(|s| s.join_on(left, right))
    }
}

impl Query<Comparing> {
    pub fn eq(self, value: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.eq(value))
    }

    pub fn ne(self, value: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.ne(value))
    }

    pub fn lt(self, value: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.lt(value))
    }

    pub fn le(self, value: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.le(value))
    }

    pub fn gt(self, value: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.gt(value))
    }

    pub fn ge(self, value: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.ge(value))
    }

    pub fn like(self, pattern: impl ToValue) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.like(pattern))
    }

    pub fn is_null(self) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.is_null())
    }

    pub fn is_not_null(self) -> OrmResult<Query<Filtering>> {
        self.step(|s| s.is_not_null())
    }

    pub fn in_list<I>(self, values: I) -> OrmResult<Query<Filtering>>
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.step(|s| s.in_list(values))
    }
}

/// `where_col` / `where_expr` for every position a `WHERE` may open or continue.
macro_rules! impl_where {
    ($($state:ty),*) => {
        $(
            impl Query<$state> {
                pub fn where_col(self, column: &str) -> OrmResult<Query<Comparing>> {
                    self.step(|s| s.where_col(column))
                }

                pub fn where_expr(
                    self,
                    template: &str,
                    args: &[&dyn ToValue],
                ) -> OrmResult<Query<Filtering>> {
                    self.step(|s| s.where_expr(template, args))
                }
            }
        )*
    };
}

impl_where!(Sourced, Filtering, Setting, Deleting);

/// `order_by` / `limit` for every position a select may be closed from.
macro_rules! impl_tail {
    ($($state:ty),*) => {
        $(
            impl Query<$state> {
                pub fn order_by(self, expr: &str) -> OrmResult<Query<Ordering>> {
                    self.step(|s| s.order_by(expr))
                }

                pub fn order_by_desc(self, expr: &str) -> OrmResult<Query<Ordering>> {
                    self.step(|s| s.order_by_desc(expr))
                }

                pub fn limit(self, n: u64) -> OrmResult<Query<Finished>> {
                    self.step(|s| s.limit(n))
                }

                pub fn limit_offset(self, n: u64, offset: u64) -> OrmResult<Query<Finished>> {
                    self.step(|s| s.limit_offset(n, offset))
                }
            }
        )*
    };
}

impl_tail!(Sourced, Filtering);

impl Query<Ordering> {
    pub fn order_by(self, expr: &str) -> OrmResult<Self> {
        self.step(|s| s.order_by(expr))
    }

    pub fn order_by_desc(self, expr: &str) -> OrmResult<Self> {
        self.step(|s| s.order_by_desc(expr))
    }

    pub fn limit(self, n: u64) -> OrmResult<Query<Finished>> {
        self.step(|s| s.limit(n))
    }

    pub fn limit_offset(self, n: u64, offset: u64) -> OrmResult<Query<Finished>> {
        self.step(|s| s.limit_offset(n, offset))
    }
}

impl Query<Inserting> {
    pub fn values(self, row: &[&dyn ToValue]) -> OrmResult<Query<Valued>> {
        self.step(|s| s.values(row))
    }
}

impl Query<Valued> {
    pub fn values(self, row: &[&dyn ToValue]) -> OrmResult<Self> {
        self.step(|s| s.values(row))
    }

    pub fn upsert(self, keys: &[&str]) -> OrmResult<Query<Finished>> {
        self.step(|s| s.upsert(keys))
    }
}

impl Query<Updating> {
    pub fn set(self, column: &str, value: impl ToValue) -> OrmResult<Query<Setting>> {
        self.step(|s| s.set(column, value))
    }
}

impl Query<Setting> {
    pub fn set(self, column: &str, value: impl ToValue) -> OrmResult<Self> {
        self.step(|s| s.set(column, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Sqlite};
    use crate::statement::State;

    #[test]
    fn select_chain() -> OrmResult<()> {
        let q = Query::new(MySql)
            .select("id")?
            .from("users")?
            .where_col("age")?
            .ge(18)?
            .order_by("name")?
            .limit(10)?;
        assert_eq!(
            q.as_str(),
            "SELECT `id` FROM `users` WHERE (`age`>=18) ORDER BY `name` LIMIT 10"
        );
        Ok(())
    }

    #[test]
    fn join_then_filter() -> OrmResult<()> {
        let q = Query::new(Sqlite)
            .select("u.id")?
            .from_as("users", "u")?
            .join(JoinKind::Inner, "teams", Some("t"))?
            .on("t.id", "u.team_id")?
            .where_col("t.name")?
            .eq("core")?;
        assert_eq!(
            q.to_string(),
            "SELECT \"u\".\"id\" FROM \"users\" \"u\"\nINNER JOIN \"teams\" \"t\" ON \"t\".\"id\"=\"u\".\"team_id\" WHERE (\"t\".\"name\"='core')"
        );
        assert_eq!(q.state(), State::WhereClause);
        Ok(())
    }

    #[test]
    fn insert_update_delete() -> OrmResult<()> {
        let ins = Query::new(MySql)
            .insert("t", &["k", "v"])?
            .values(&[&1, &"a"])?
            .upsert(&["k"])?;
        assert_eq!(
            ins.as_str(),
            "INSERT INTO `t` (`k`,`v`) VALUES (1,'a') ON DUPLICATE KEY UPDATE `v`=VALUES(`v`)"
        );

        let upd = Query::new(MySql)
            .update("t")?
            .set("v", "b")?
            .where_col("k")?
            .eq(1)?;
        assert_eq!(upd.as_str(), "UPDATE `t` SET `v`='b' WHERE (`k`=1)");

        let del = Query::new(MySql).delete("t")?.where_col("k")?.is_null()?;
        assert_eq!(del.into_statement().as_str(), "DELETE FROM `t` WHERE (`k` IS NULL)");
        Ok(())
    }

    #[test]
    fn runtime_checks_still_apply() -> OrmResult<()> {
        let q = Query::new(MySql).insert("t", &["a", "b"])?;
        let err = q.values(&[&1]).unwrap_err();
        assert!(err.is_protocol_violation());
        Ok(())
    }

    #[test]
    fn transforms() -> OrmResult<()> {
        let q = Query::new(MySql).select("a")?.from("t")?;
        assert_eq!(q.to_count()?.as_str(), "SELECT COUNT(*) FROM `t`");
        let del = q.to_delete()?.where_col("a")?.eq(1)?;
        assert_eq!(del.as_str(), "DELETE FROM `t` WHERE (`a`=1)");
        Ok(())
    }

    #[test]
    fn filtered_select_to_delete() -> OrmResult<()> {
        let q = Query::new(MySql)
            .select("a")?
            .select("b")?
            .from("t")?
            .where_col("a")?
            .eq(1)?;
        let del = q.to_delete()?;
        assert_eq!(del.as_str(), "DELETE FROM `t` WHERE (`a`=1)");
        let del = del.where_col("b")?.is_null()?;
        assert_eq!(del.as_str(), "DELETE FROM `t` WHERE (`a`=1) AND (`b` IS NULL)");
        Ok(())
    }
}
