//! Incremental SQL statement builder.
//!
//! [`Statement`] owns one append-only text buffer and a clause state. Every
//! clause method checks the current [`State`] first and fails with
//! [`OrmError::ProtocolViolation`] before writing anything when the call is
//! out of order. Values are always rendered as escaped literals.
//!
//! # Example
//!
//! ```ignore
//! use sqlcraft::{Statement, dialect::MySql};
//!
//! let mut q = Statement::new(MySql);
//! q.select("id")?.select("name")?.from("users")?;
//! q.where_col("status")?.eq("active")?;
//! q.order_by_desc("created_at")?.limit(10)?;
//!
//! assert_eq!(
//!     q.as_str(),
//!     "SELECT `id`,`name` FROM `users` WHERE (`status`='active') ORDER BY `created_at` DESC LIMIT 10"
//! );
//! ```

mod entity;
mod filter;
mod insert;
mod select;
mod transform;
mod update;

#[cfg(test)]
mod tests;

pub use filter::{CompareOp, Operand};
pub use select::JoinKind;

use crate::config::SqlConfig;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::escape;
use crate::schema::EntityDescriptor;
use crate::value::{ToValue, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Clause the statement is currently in.
///
/// Exactly one state is active; it alone decides which operation may come next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Nothing open; a new command may begin.
    Start,
    /// Inside `SELECT` column list.
    SelectList,
    /// After `FROM <table>`.
    FromClause,
    /// After `INSERT INTO <table> (<cols>)`.
    InsertHead,
    /// After at least one `VALUES` row.
    ValuesList,
    /// After `UPDATE <table>`.
    UpdateHead,
    /// Inside `SET` assignments.
    SetList,
    /// After `DELETE FROM <table>`.
    DeleteHead,
    /// After a `JOIN` source, before `ON`.
    JoinHead,
    /// Inside a join's `ON` predicate.
    JoinOnClause,
    /// Inside `WHERE`, no condition pending.
    WhereClause,
    /// Inside an `OR` group of a `WHERE`.
    WhereOrGroup,
    /// Inside `ORDER BY`.
    OrderByList,
    /// After clauses that only accept trailing options (upsert, INSERT ... SELECT).
    TrailingOptions,
    /// A `WHERE` column was written and waits for its comparison.
    WhereConditionPending,
}

type EntityCache = Arc<RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>>;

/// Per-command bookkeeping, swapped out while a nested sub-statement runs.
#[derive(Debug, Clone)]
struct Frame {
    state: State,
    command_start: usize,
    columns_start: Option<usize>,
    columns_end: Option<usize>,
    in_or_group: bool,
    /// Offset just past the `(` of the pending `WHERE` condition.
    condition_start: usize,
    insert_columns: Vec<String>,
    entity: Option<Arc<EntityDescriptor>>,
}

impl Frame {
    fn start(at: usize) -> Self {
        Self {
            state: State::Start,
            command_start: at,
            columns_start: None,
            columns_end: None,
            in_or_group: false,
            condition_start: at,
            insert_columns: Vec::new(),
            entity: None,
        }
    }
}

/// A SQL statement (or batch of commands) under construction.
///
/// Cloning deep-copies the text and shares the dialect, schema resolver and
/// resolved-entity cache.
#[must_use]
#[derive(Debug, Clone)]
pub struct Statement {
    buf: String,
    frame: Frame,
    depth: usize,
    config: SqlConfig,
    entities: EntityCache,
    tag: Option<String>,
}

impl Statement {
    /// Create an empty statement for `dialect`.
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self::with_config(&SqlConfig::new(dialect))
    }

    /// Create an empty statement sharing `config`.
    pub fn with_config(config: &SqlConfig) -> Self {
        Self {
            buf: String::new(),
            frame: Frame::start(0),
            depth: 0,
            config: config.clone(),
            entities: EntityCache::default(),
            tag: None,
        }
    }

    /// Create an empty statement, inferring the dialect from a descriptor.
    pub fn from_descriptor(descriptor: &str) -> OrmResult<Self> {
        Ok(Self::with_config(&SqlConfig::from_descriptor(descriptor)?))
    }

    /// The statement's dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.config.dialect.as_ref()
    }

    /// The configuration this statement was created with.
    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    /// Current clause state.
    pub fn state(&self) -> State {
        self.frame.state
    }

    /// Rendered text so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Rendered text so far, owned.
    pub fn to_sql(&self) -> String {
        self.buf.clone()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Associate a tag for log correlation.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// Associate a tag for log correlation (consuming version).
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The tag set by [`Statement::tag`], if any.
    pub fn get_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Close the current command with the dialect separator and start a new one.
    ///
    /// A no-op when nothing is open. Not allowed inside a nested sub-statement
    /// or while a condition or OR group is open.
    pub fn new_command(&mut self) -> OrmResult<&mut Self> {
        match self.frame.state {
            State::Start => return Ok(self),
            State::WhereConditionPending | State::WhereOrGroup => {
                return Err(OrmError::protocol("new_command", self.frame.state));
            }
            _ if self.depth > 0 => {
                return Err(OrmError::protocol("new_command", self.frame.state));
            }
            _ => {}
        }
        self.buf.push_str(self.config.dialect.separator());
        self.frame = Frame::start(self.buf.len());
        Ok(self)
    }

    /// Drop the command currently being opened when nothing but its head was written.
    pub fn discard_empty_command(&mut self) -> OrmResult<&mut Self> {
        self.expect(
            "discard_empty_command",
            &[
                State::SelectList,
                State::InsertHead,
                State::UpdateHead,
                State::DeleteHead,
            ],
        )?;
        let start = self.frame.command_start;
        self.buf.truncate(start);
        self.frame = Frame::start(start);
        Ok(self)
    }

    /// Append raw SQL without changing state.
    pub fn raw(&mut self, sql: &str) -> &mut Self {
        self.buf.push_str(sql);
        self
    }

    /// Append a template with `{0}`, `{1}` placeholders, each argument rendered
    /// as an escaped literal. The state is unchanged.
    pub fn append(&mut self, template: &str, args: &[&dyn ToValue]) -> OrmResult<&mut Self> {
        self.push_template(template, args)?;
        Ok(self)
    }

    // ==================== Internal helpers ====================

    pub(crate) fn expect(&self, operation: &'static str, allowed: &[State]) -> OrmResult<()> {
        if allowed.contains(&self.frame.state) {
            Ok(())
        } else {
            Err(OrmError::protocol(operation, self.frame.state))
        }
    }

    pub(crate) fn push_ident(&mut self, ident: &str) {
        escape::quote_ident(&mut self.buf, self.config.dialect.as_ref(), ident);
    }

    pub(crate) fn push_expr(&mut self, expr: &str) {
        escape::quote_expr(&mut self.buf, self.config.dialect.as_ref(), expr);
    }

    pub(crate) fn push_literal(&mut self, value: &Value) -> OrmResult<()> {
        escape::write_literal(&mut self.buf, self.config.dialect.as_ref(), value)
    }

    pub(crate) fn push_literals(&mut self, values: &[Value]) -> OrmResult<()> {
        escape::write_literal_list(&mut self.buf, self.config.dialect.as_ref(), values)
    }

    pub(crate) fn push_template(&mut self, template: &str, args: &[&dyn ToValue]) -> OrmResult<()> {
        let args = to_values(args);
        escape::interpolate(&mut self.buf, self.config.dialect.as_ref(), template, &args)
    }

    /// Run `build` as a sub-statement starting at [`State::Start`] on the same
    /// buffer. The parent's state and bookmarks come back whether or not
    /// `build` fails; failures propagate.
    pub(crate) fn nested<F>(&mut self, operation: &'static str, parens: bool, build: F) -> OrmResult<()>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        if parens {
            self.buf.push('(');
        }
        let parent = std::mem::replace(&mut self.frame, Frame::start(self.buf.len()));
        self.depth += 1;
        let result = build(self).and_then(|()| match self.frame.state {
            State::Start
            | State::InsertHead
            | State::UpdateHead
            | State::WhereConditionPending
            | State::WhereOrGroup => Err(OrmError::protocol(operation, self.frame.state)),
            _ => Ok(()),
        });
        self.depth -= 1;
        self.frame = parent;
        result?;
        if parens {
            self.buf.push(')');
        }
        Ok(())
    }

    /// Resolve `T` through the configured schema resolver, once per statement.
    pub fn entity<T: 'static>(&self) -> OrmResult<Arc<EntityDescriptor>> {
        let key = TypeId::of::<T>();
        let cached = self
            .entities
            .read()
            .ok()
            .and_then(|cache| cache.get(&key).cloned());
        if let Some(desc) = cached {
            return Ok(desc);
        }

        let resolver = self.config.schema.as_ref().ok_or_else(|| {
            OrmError::unmapped(format!(
                "no schema resolver configured to map {}",
                std::any::type_name::<T>()
            ))
        })?;
        let desc = crate::schema::resolve::<T>(resolver.as_ref())?;
        if let Ok(mut cache) = self.entities.write() {
            cache.insert(key, Arc::clone(&desc));
        }
        Ok(desc)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

pub(crate) fn to_values(args: &[&dyn ToValue]) -> Vec<Value> {
    args.iter().map(|a| a.to_value()).collect()
}
