use super::{State, Statement, to_values};
use crate::error::{OrmError, OrmResult};
use crate::value::{ToValue, Value};

impl Statement {
    fn insert_head(
        &mut self,
        operation: &'static str,
        table: &str,
        columns: &[&str],
        ignore: bool,
    ) -> OrmResult<()> {
        self.expect(operation, &[State::Start])?;
        let head = if ignore {
            self.config.dialect.insert_ignore().ok_or_else(|| {
                OrmError::UnsupportedDialect(format!(
                    "{} has no insert-ignore form",
                    self.config.dialect.name()
                ))
            })?
        } else {
            "INSERT INTO "
        };
        self.buf.push_str(head);
        self.push_ident(table);
        self.buf.push_str(" (");
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.push_ident(col);
        }
        self.buf.push(')');
        self.frame.insert_columns = columns.iter().map(|c| c.to_string()).collect();
        self.frame.state = State::InsertHead;
        Ok(())
    }

    /// Open `INSERT INTO <table> (<columns>)`.
    pub fn insert(&mut self, table: &str, columns: &[&str]) -> OrmResult<&mut Self> {
        self.insert_head("insert", table, columns, false)?;
        Ok(self)
    }

    /// Open an insert that silently skips rows conflicting with a unique key.
    ///
    /// Fails with [`OrmError::UnsupportedDialect`] when the dialect has no
    /// such form.
    pub fn insert_ignore(&mut self, table: &str, columns: &[&str]) -> OrmResult<&mut Self> {
        self.insert_head("insert_ignore", table, columns, true)?;
        Ok(self)
    }

    /// `INSERT INTO <table> (<columns>) <select>`.
    ///
    /// The select built by `build` is not parenthesized. Afterwards only an
    /// upsert or trailing options may follow.
    pub fn insert_select<F>(&mut self, table: &str, columns: &[&str], build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.insert_head("insert_select", table, columns, false)?;
        self.buf.push(' ');
        self.nested("insert_select", false, build)?;
        self.frame.state = State::TrailingOptions;
        Ok(self)
    }

    /// Append one `VALUES` row.
    ///
    /// The row must have one value per insert column.
    pub fn values(&mut self, row: &[&dyn ToValue]) -> OrmResult<&mut Self> {
        let row = to_values(row);
        self.values_row("values", &row)?;
        Ok(self)
    }

    /// Append several `VALUES` rows.
    pub fn values_rows<R>(&mut self, rows: impl IntoIterator<Item = R>) -> OrmResult<&mut Self>
    where
        R: AsRef<[Value]>,
    {
        for row in rows {
            self.values_row("values_rows", row.as_ref())?;
        }
        Ok(self)
    }

    pub(crate) fn values_row(&mut self, operation: &'static str, row: &[Value]) -> OrmResult<()> {
        let opener = match self.frame.state {
            State::InsertHead => " VALUES (",
            State::ValuesList => ",(",
            state => return Err(OrmError::protocol(operation, state)),
        };
        if row.len() != self.frame.insert_columns.len() {
            return Err(OrmError::protocol(operation, self.frame.state));
        }
        self.buf.push_str(opener);
        self.push_literals(row)?;
        self.buf.push(')');
        self.frame.state = State::ValuesList;
        Ok(())
    }

    /// Turn the insert into an upsert on the conflict target `keys`.
    ///
    /// Every insert column that is not a key takes the incoming value.
    /// `keys` must not be empty.
    pub fn upsert(&mut self, keys: &[&str]) -> OrmResult<&mut Self> {
        self.check_upsert("upsert", keys)?;
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let updates: Vec<String> = self
            .frame
            .insert_columns
            .iter()
            .filter(|c| !keys.contains(c))
            .cloned()
            .collect();
        self.write_upsert(&keys, &updates);
        Ok(self)
    }

    /// Upsert with an explicit list of columns to overwrite.
    pub fn upsert_columns(&mut self, keys: &[&str], updates: &[&str]) -> OrmResult<&mut Self> {
        self.check_upsert("upsert_columns", keys)?;
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let updates: Vec<String> = updates.iter().map(|c| c.to_string()).collect();
        self.write_upsert(&keys, &updates);
        Ok(self)
    }

    fn check_upsert(&self, operation: &'static str, keys: &[&str]) -> OrmResult<()> {
        self.expect(operation, &[State::ValuesList, State::TrailingOptions])?;
        if keys.is_empty() {
            return Err(OrmError::protocol(operation, self.frame.state));
        }
        Ok(())
    }

    pub(crate) fn write_upsert(&mut self, keys: &[String], updates: &[String]) {
        self.config.dialect.write_upsert(&mut self.buf, keys, updates);
        self.frame.state = State::TrailingOptions;
    }
}
