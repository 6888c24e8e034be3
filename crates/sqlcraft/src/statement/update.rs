use super::{State, Statement};
use crate::error::{OrmError, OrmResult};
use crate::value::ToValue;

impl Statement {
    /// Open `UPDATE <table>`.
    pub fn update(&mut self, table: &str) -> OrmResult<&mut Self> {
        self.expect("update", &[State::Start])?;
        self.buf.push_str("UPDATE ");
        self.push_ident(table);
        self.frame.state = State::UpdateHead;
        Ok(self)
    }

    fn begin_assignment(&mut self, operation: &'static str, column: &str) -> OrmResult<()> {
        match self.frame.state {
            State::UpdateHead => self.buf.push_str(" SET "),
            State::SetList => self.buf.push(','),
            state => return Err(OrmError::protocol(operation, state)),
        }
        self.push_expr(column);
        self.buf.push('=');
        self.frame.state = State::SetList;
        Ok(())
    }

    /// Write `SET <column>=` and leave the value to [`Statement::raw`] or
    /// [`Statement::append`].
    pub fn set_column(&mut self, column: &str) -> OrmResult<&mut Self> {
        self.begin_assignment("set_column", column)?;
        Ok(self)
    }

    /// Assign a literal: `SET <column>=<value>`.
    pub fn set(&mut self, column: &str, value: impl ToValue) -> OrmResult<&mut Self> {
        self.begin_assignment("set", column)?;
        self.push_literal(&value.to_value())?;
        Ok(self)
    }

    /// Assign a templated expression, e.g. `set_expr("hits", "hits+{0}", &[&1])`.
    ///
    /// Identifiers in the template are not quoted.
    pub fn set_expr(
        &mut self,
        column: &str,
        template: &str,
        args: &[&dyn ToValue],
    ) -> OrmResult<&mut Self> {
        self.begin_assignment("set_expr", column)?;
        self.push_template(template, args)?;
        Ok(self)
    }

    /// Assign the result of a parenthesized sub-select.
    pub fn set_subquery<F>(&mut self, column: &str, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.begin_assignment("set_subquery", column)?;
        self.nested("set_subquery", true, build)?;
        Ok(self)
    }

    /// Open `DELETE FROM <table>`.
    pub fn delete(&mut self, table: &str) -> OrmResult<&mut Self> {
        self.expect("delete", &[State::Start])?;
        self.buf.push_str("DELETE FROM ");
        self.push_ident(table);
        self.frame.state = State::DeleteHead;
        Ok(self)
    }
}
