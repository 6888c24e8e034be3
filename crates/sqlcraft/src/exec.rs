//! Running a finished [`Statement`] through a [`Transport`].
//!
//! Every entry point funnels into one driver that sends the text, walks each
//! result of the batch in order and enforces a [`Cardinality`] policy while
//! rows stream in.
//!
//! ```ignore
//! let mut q = Statement::new(Postgres);
//! q.select("id")?.select("name")?.from("users")?;
//! q.where_col("id")?.eq(7)?;
//!
//! let user: (i64, String) = q.fetch_one_as(&client).await?;
//! let maybe: Option<(i64, String)> = q.fetch_opt_as(&client).await?;
//! ```

use crate::client::{RowCursor, RowSource, Transport};
use crate::error::{CardinalityViolation, OrmError, OrmResult};
use crate::row::{FromRow, FromValue, Row};
use crate::statement::Statement;
use std::borrow::Cow;
use std::fmt;

/// Row-count contract checked while results stream in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cardinality {
    /// Fail as soon as a second row arrives.
    pub single: bool,
    /// Fail after draining everything if no row arrived at all.
    pub no_default: bool,
}

impl Cardinality {
    /// Any number of rows.
    pub const ANY: Self = Self {
        single: false,
        no_default: false,
    };
    /// At most one row.
    pub const SINGLE: Self = Self {
        single: true,
        no_default: false,
    };
    /// At least one row.
    pub const NO_DEFAULT: Self = Self {
        single: false,
        no_default: true,
    };
    /// Exactly one row.
    pub const EXACTLY_ONE: Self = Self {
        single: true,
        no_default: true,
    };
}

/// Describes the result a row reader is about to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSetInfo {
    /// Position among the batch's row-returning results, from 0.
    pub index: usize,
    /// Column names.
    pub columns: Vec<String>,
}

/// Totals for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecSummary {
    /// Rows read across all results.
    pub rows: u64,
    /// Row-returning results seen.
    pub result_sets: usize,
    /// Rows changed, as reported by the transport.
    pub rows_affected: Option<u64>,
}

/// The type of SQL command at the start of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Detect the command type from SQL text.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            Self::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            Self::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            Self::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            Self::Delete
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skip whitespace, comments and opening parentheses.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => s = &s[pos + 1..],
                None => return "",
            }
            continue;
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => s = &s[pos + 2..],
                None => return "",
            }
            continue;
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    s.get(0..keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}

/// Cut `sql` to at most `max_bytes` on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn logged_sql(sql: &str, max: Option<usize>) -> Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => Cow::Owned(format!("{}...", truncate_sql_bytes(sql, max))),
        _ => Cow::Borrowed(sql),
    }
}

/// Receives the rows of one execution.
trait RowSink {
    fn begin_result_set(&mut self, info: &ResultSetInfo);
    fn accept(&mut self, row: &Row<'_>) -> OrmResult<()>;
}

/// Asks `reader_for` for a fresh reader at every result.
struct PerResultSet<F, R> {
    reader_for: F,
    reader: Option<R>,
}

impl<F, R> RowSink for PerResultSet<F, R>
where
    F: FnMut(&ResultSetInfo) -> R,
    R: FnMut(&Row<'_>) -> OrmResult<()>,
{
    fn begin_result_set(&mut self, info: &ResultSetInfo) {
        self.reader = Some((self.reader_for)(info));
    }

    fn accept(&mut self, row: &Row<'_>) -> OrmResult<()> {
        match self.reader.as_mut() {
            Some(reader) => reader(row),
            None => Ok(()),
        }
    }
}

struct Collect<T>(Vec<T>);

impl<T: FromRow> RowSink for Collect<T> {
    fn begin_result_set(&mut self, _info: &ResultSetInfo) {}

    fn accept(&mut self, row: &Row<'_>) -> OrmResult<()> {
        self.0.push(T::from_row(row)?);
        Ok(())
    }
}

struct Scalars<T>(Vec<T>);

impl<T: FromValue> RowSink for Scalars<T> {
    fn begin_result_set(&mut self, _info: &ResultSetInfo) {}

    fn accept(&mut self, row: &Row<'_>) -> OrmResult<()> {
        self.0.push(row.get::<T>(0)?);
        Ok(())
    }
}

struct PerSetCollect<T>(Vec<Vec<T>>);

impl<T: FromRow> RowSink for PerSetCollect<T> {
    fn begin_result_set(&mut self, _info: &ResultSetInfo) {
        self.0.push(Vec::new());
    }

    fn accept(&mut self, row: &Row<'_>) -> OrmResult<()> {
        let item = T::from_row(row)?;
        if let Some(set) = self.0.last_mut() {
            set.push(item);
        }
        Ok(())
    }
}

struct Discard;

impl RowSink for Discard {
    fn begin_result_set(&mut self, _info: &ResultSetInfo) {}

    fn accept(&mut self, _row: &Row<'_>) -> OrmResult<()> {
        Ok(())
    }
}

impl Statement {
    async fn drive<T, S>(&self, transport: &T, policy: Cardinality, sink: &mut S) -> OrmResult<ExecSummary>
    where
        T: Transport,
        S: RowSink,
    {
        let sql = self.as_str();
        let kind = StatementKind::from_sql(sql);
        let tag = self.get_tag().unwrap_or("-");
        tracing::debug!(
            target: "sqlcraft.sql",
            statement = %kind,
            tag,
            sql = %logged_sql(sql, self.config().max_logged_sql),
            "executing"
        );

        let breach = |violation: CardinalityViolation| {
            tracing::warn!(target: "sqlcraft.sql", statement = %kind, tag, %violation, "cardinality violation");
            OrmError::Cardinality(violation)
        };

        let mut cursor = transport.execute(sql).await?;
        let mut summary = ExecSummary::default();
        loop {
            let field_count = cursor.field_count();
            if field_count > 0 {
                let info = ResultSetInfo {
                    index: summary.result_sets,
                    columns: (0..field_count)
                        .map(|i| cursor.field_name(i).unwrap_or_default().to_string())
                        .collect(),
                };
                tracing::trace!(target: "sqlcraft.sql", result_set = info.index, columns = field_count, "reading result set");
                sink.begin_result_set(&info);
                summary.result_sets += 1;

                while cursor.next_row().await? {
                    summary.rows += 1;
                    if policy.single && summary.rows > 1 {
                        return Err(breach(CardinalityViolation::TooManyRows));
                    }
                    sink.accept(&Row::new(&cursor))?;
                }
            }
            if !cursor.next_result_set().await? {
                break;
            }
        }

        if policy.no_default && summary.rows == 0 {
            return Err(breach(CardinalityViolation::NoRows));
        }
        summary.rows_affected = cursor.rows_affected();
        tracing::debug!(
            target: "sqlcraft.sql",
            statement = %kind,
            tag,
            rows = summary.rows,
            result_sets = summary.result_sets,
            rows_affected = ?summary.rows_affected,
            "completed"
        );
        Ok(summary)
    }

    /// Execute and hand every row to a reader obtained per result.
    ///
    /// `reader_for` is called once at the start of each row-returning result
    /// and the reader it returns receives that result's rows. Returns the
    /// total number of rows read.
    pub async fn query_with<T, F, R>(&self, transport: &T, policy: Cardinality, reader_for: F) -> OrmResult<u64>
    where
        T: Transport,
        F: FnMut(&ResultSetInfo) -> R,
        R: FnMut(&Row<'_>) -> OrmResult<()>,
    {
        let mut sink = PerResultSet {
            reader_for,
            reader: None,
        };
        Ok(self.drive(transport, policy, &mut sink).await?.rows)
    }

    /// Execute and map every row of every result.
    pub async fn fetch_all_as<R: FromRow>(&self, transport: &impl Transport) -> OrmResult<Vec<R>> {
        let mut sink = Collect(Vec::new());
        self.drive(transport, Cardinality::ANY, &mut sink).await?;
        Ok(sink.0)
    }

    /// Execute and map the only row; zero or several rows are an error.
    pub async fn fetch_one_as<R: FromRow>(&self, transport: &impl Transport) -> OrmResult<R> {
        let mut sink = Collect(Vec::with_capacity(1));
        self.drive(transport, Cardinality::EXACTLY_ONE, &mut sink).await?;
        sink.0
            .pop()
            .ok_or(OrmError::Cardinality(CardinalityViolation::NoRows))
    }

    /// Execute and map the row, if any; several rows are an error.
    pub async fn fetch_opt_as<R: FromRow>(&self, transport: &impl Transport) -> OrmResult<Option<R>> {
        let mut sink = Collect(Vec::with_capacity(1));
        self.drive(transport, Cardinality::SINGLE, &mut sink).await?;
        Ok(sink.0.pop())
    }

    /// Execute and read the first column of the only row.
    pub async fn fetch_scalar_one<V: FromValue>(&self, transport: &impl Transport) -> OrmResult<V> {
        let mut sink = Scalars(Vec::with_capacity(1));
        self.drive(transport, Cardinality::EXACTLY_ONE, &mut sink).await?;
        sink.0
            .pop()
            .ok_or(OrmError::Cardinality(CardinalityViolation::NoRows))
    }

    /// Execute and read the first column of every row.
    pub async fn fetch_scalar_all<V: FromValue>(&self, transport: &impl Transport) -> OrmResult<Vec<V>> {
        let mut sink = Scalars(Vec::new());
        self.drive(transport, Cardinality::ANY, &mut sink).await?;
        Ok(sink.0)
    }

    /// Execute and keep each result's rows separately, in order.
    pub async fn fetch_sets<R: FromRow>(&self, transport: &impl Transport) -> OrmResult<Vec<Vec<R>>> {
        let mut sink = PerSetCollect(Vec::new());
        self.drive(transport, Cardinality::ANY, &mut sink).await?;
        Ok(sink.0)
    }

    /// Execute, discarding rows, and return the rows affected.
    pub async fn execute(&self, transport: &impl Transport) -> OrmResult<u64> {
        let summary = self.drive(transport, Cardinality::ANY, &mut Discard).await?;
        Ok(summary.rows_affected.unwrap_or(0))
    }

    /// Execute with `policy`, discarding rows, and return the totals.
    pub async fn execute_summary(&self, transport: &impl Transport, policy: Cardinality) -> OrmResult<ExecSummary> {
        self.drive(transport, policy, &mut Discard).await
    }
}
