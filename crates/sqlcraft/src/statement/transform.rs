//! Derived statements built from a finished select's bookmarks.

use super::{State, Statement};
use crate::error::{OrmError, OrmResult};

impl Statement {
    fn column_span(&self, operation: &'static str) -> OrmResult<(usize, usize)> {
        match (self.frame.columns_start, self.frame.columns_end) {
            (Some(start), Some(end)) if start <= end => Ok((start, end)),
            _ => Err(OrmError::protocol(operation, self.frame.state)),
        }
    }

    fn derive(&self, buf: String) -> Statement {
        let mut derived = self.clone();
        derived.buf = buf;
        derived.frame.columns_start = None;
        derived.frame.columns_end = None;
        derived
    }

    /// The same query with its select list replaced by `COUNT(*)`.
    ///
    /// Everything after the select list (joins, conditions, ordering, limit)
    /// is kept. Fails unless the current command is a select that reached
    /// `FROM`.
    pub fn to_count(&self) -> OrmResult<Statement> {
        let (start, end) = self.column_span("to_count")?;
        let mut buf = String::with_capacity(self.buf.len());
        buf.push_str(&self.buf[..start]);
        buf.push_str("COUNT(*)");
        buf.push_str(&self.buf[end..]);
        Ok(self.derive(buf))
    }

    /// The same query turned into `DELETE FROM ...`, keeping its source and
    /// conditions.
    ///
    /// Earlier commands of a batch are dropped. Fails unless the current
    /// command is a select that reached `FROM`.
    pub fn to_delete(&self) -> OrmResult<Statement> {
        let (_, end) = self.column_span("to_delete")?;
        let mut buf = String::with_capacity(self.buf.len() - end + 6);
        buf.push_str("DELETE");
        buf.push_str(&self.buf[end..]);
        let mut derived = self.derive(buf);
        derived.frame.command_start = 0;
        if derived.frame.state == State::FromClause {
            derived.frame.state = State::DeleteHead;
        }
        Ok(derived)
    }
}
