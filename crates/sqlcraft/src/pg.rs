//! [`Transport`] for `tokio-postgres` clients.
//!
//! Statements are sent through the simple query protocol so a batch of
//! several commands runs in one round trip. Every value comes back as text
//! and is converted by [`FromValue`](crate::row::FromValue) when read.

use crate::client::{BufferedCursor, Column, FieldType, ResultSet, Transport};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::future::Future;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, Transaction};

/// Connect without TLS and drive the connection on the current runtime.
///
/// ```ignore
/// let client = sqlcraft::pg::connect("postgres://postgres@localhost/app").await?;
/// let n: i64 = q.to_count()?.fetch_scalar_one(&client).await?;
/// ```
pub async fn connect(database_url: &str) -> OrmResult<Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "sqlcraft.pg", error = %e, "connection closed");
        }
    });
    Ok(client)
}

/// Folds simple-query responses into buffered results.
#[derive(Debug, Default)]
struct BatchBuilder {
    sets: Vec<ResultSet>,
    rows_affected: u64,
    reported: bool,
    in_rows: bool,
}

impl BatchBuilder {
    fn describe<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let columns = names
            .into_iter()
            .map(|name| Column::new(name, FieldType::Text))
            .collect();
        self.sets.push(ResultSet::new(columns));
        self.in_rows = true;
    }

    fn row(&mut self, values: Vec<Value>) -> OrmResult<()> {
        match self.sets.last_mut() {
            Some(set) if self.in_rows => {
                set.rows.push(values);
                Ok(())
            }
            _ => Err(OrmError::Transport(
                "row received before its row description".to_string(),
            )),
        }
    }

    /// `CommandComplete` after a row-returning command carries the row count,
    /// not a change count, so only bare commands are summed.
    fn complete(&mut self, n: u64) {
        if self.in_rows {
            self.in_rows = false;
        } else {
            self.rows_affected += n;
            self.reported = true;
        }
    }

    fn finish(self) -> BufferedCursor {
        let cursor = BufferedCursor::new(self.sets);
        if self.reported {
            cursor.with_rows_affected(self.rows_affected)
        } else {
            cursor
        }
    }
}

fn buffer(messages: Vec<SimpleQueryMessage>) -> OrmResult<BufferedCursor> {
    let mut batch = BatchBuilder::default();
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                batch.describe(columns.iter().map(|c| c.name()));
            }
            SimpleQueryMessage::Row(row) => {
                let values = (0..row.len())
                    .map(|i| match row.get(i) {
                        Some(text) => Value::Text(text.to_string()),
                        None => Value::Null,
                    })
                    .collect();
                batch.row(values)?;
            }
            SimpleQueryMessage::CommandComplete(n) => batch.complete(n),
            _ => {}
        }
    }
    tracing::trace!(
        target: "sqlcraft.pg",
        result_sets = batch.sets.len(),
        rows_affected = batch.rows_affected,
        "buffered batch"
    );
    Ok(batch.finish())
}

impl Transport for Client {
    type Cursor = BufferedCursor;

    fn execute(&self, sql: &str) -> impl Future<Output = OrmResult<BufferedCursor>> + Send {
        async move { buffer(self.simple_query(sql).await?) }
    }
}

impl Transport for Transaction<'_> {
    type Cursor = BufferedCursor;

    fn execute(&self, sql: &str) -> impl Future<Output = OrmResult<BufferedCursor>> + Send {
        async move { buffer(self.simple_query(sql).await?) }
    }
}
