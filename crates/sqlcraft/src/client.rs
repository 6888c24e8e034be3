//! Transport traits the execution bridge drives, plus an in-memory cursor.
//!
//! A [`Transport`] turns SQL text into a [`RowCursor`]. The cursor starts on
//! the first result of the batch, before its first row; [`RowCursor::next_row`]
//! walks rows and [`RowCursor::next_result_set`] moves to the next result.
//! Results with no columns (plain commands) only contribute to
//! [`RowCursor::rows_affected`].

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::future::Future;

/// Declared type of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    Bytes,
    DateTime,
    Date,
    Time,
    #[default]
    Unknown,
}

/// Column-wise access to the cursor's current row.
pub trait RowSource {
    /// Number of columns in the current result.
    fn field_count(&self) -> usize;

    /// Column name at `index`.
    fn field_name(&self, index: usize) -> Option<&str>;

    /// Column type at `index`; [`FieldType::Unknown`] when out of range.
    fn field_type(&self, index: usize) -> FieldType;

    /// Value at `index` in the current row. SQL `NULL` is [`Value::Null`].
    fn value(&self, index: usize) -> OrmResult<Value>;
}

/// Forward-only cursor over the results of one executed batch.
pub trait RowCursor: RowSource + Send {
    /// Advance to the next row of the current result.
    fn next_row(&mut self) -> impl Future<Output = OrmResult<bool>> + Send;

    /// Advance to the next result of the batch.
    fn next_result_set(&mut self) -> impl Future<Output = OrmResult<bool>> + Send;

    /// Rows changed by the batch's commands, once known.
    fn rows_affected(&self) -> Option<u64>;
}

/// Something that can run SQL text.
///
/// Implemented for `tokio_postgres::Client` (feature `postgres`) and pooled
/// clients (feature `pool`).
pub trait Transport: Send + Sync {
    type Cursor: RowCursor;

    /// Send `sql` and return a cursor over its results.
    fn execute(&self, sql: &str) -> impl Future<Output = OrmResult<Self::Cursor>> + Send;
}

impl<T: Transport> Transport for &T {
    type Cursor = T::Cursor;

    fn execute(&self, sql: &str) -> impl Future<Output = OrmResult<Self::Cursor>> + Send {
        (**self).execute(sql)
    }
}

/// A result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub field_type: FieldType,
}

impl Column {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A fully materialized result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Empty result with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Result with untyped columns named `names`.
    pub fn with_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .map(|n| Column::new(*n, FieldType::Unknown))
                .collect(),
        )
    }

    /// Append a row.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }
}

/// [`RowCursor`] over results already held in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    sets: Vec<ResultSet>,
    set: usize,
    row: Option<usize>,
    rows_affected: Option<u64>,
}

impl BufferedCursor {
    pub fn new(sets: Vec<ResultSet>) -> Self {
        Self {
            sets,
            set: 0,
            row: None,
            rows_affected: None,
        }
    }

    /// Report `n` affected rows.
    pub fn with_rows_affected(mut self, n: u64) -> Self {
        self.rows_affected = Some(n);
        self
    }

    fn current(&self) -> Option<&ResultSet> {
        self.sets.get(self.set)
    }

    fn advance_row(&mut self) -> bool {
        let len = self.current().map_or(0, |s| s.rows.len());
        let next = self.row.map_or(0, |r| r + 1);
        if next < len {
            self.row = Some(next);
            true
        } else {
            self.row = Some(len);
            false
        }
    }

    fn advance_set(&mut self) -> bool {
        if self.set + 1 < self.sets.len() {
            self.set += 1;
            self.row = None;
            true
        } else {
            self.set = self.sets.len();
            false
        }
    }
}

impl RowSource for BufferedCursor {
    fn field_count(&self) -> usize {
        self.current().map_or(0, |s| s.columns.len())
    }

    fn field_name(&self, index: usize) -> Option<&str> {
        self.current()?.columns.get(index).map(|c| c.name.as_str())
    }

    fn field_type(&self, index: usize) -> FieldType {
        self.current()
            .and_then(|s| s.columns.get(index))
            .map_or(FieldType::Unknown, |c| c.field_type)
    }

    fn value(&self, index: usize) -> OrmResult<Value> {
        let row = self
            .current()
            .zip(self.row)
            .and_then(|(set, row)| set.rows.get(row));
        let Some(row) = row else {
            return Err(OrmError::Transport("cursor is not positioned on a row".to_string()));
        };
        row.get(index).cloned().ok_or_else(|| {
            OrmError::decode(
                self.field_name(index).unwrap_or("?"),
                format!("column index {index} out of range ({} columns)", row.len()),
            )
        })
    }
}

impl RowCursor for BufferedCursor {
    fn next_row(&mut self) -> impl Future<Output = OrmResult<bool>> + Send {
        let more = self.advance_row();
        async move { Ok(more) }
    }

    fn next_result_set(&mut self) -> impl Future<Output = OrmResult<bool>> + Send {
        let more = self.advance_set();
        async move { Ok(more) }
    }

    fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }
}
