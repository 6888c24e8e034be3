use super::{State, Statement};
use crate::error::{OrmError, OrmResult};

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    FullOuter,
    Cross,
}

impl JoinKind {
    /// Keyword sequence, without surrounding whitespace.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::FullOuter => "FULL OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

const JOINABLE: &[State] = &[State::FromClause, State::JoinHead, State::JoinOnClause];

impl Statement {
    // ==================== SELECT ====================

    /// Open (or extend) the select list with one column.
    fn begin_column(&mut self, operation: &'static str) -> OrmResult<()> {
        match self.frame.state {
            State::Start => {
                self.buf.push_str("SELECT ");
                self.frame.columns_start = Some(self.buf.len());
                self.frame.state = State::SelectList;
            }
            State::SelectList => self.buf.push(','),
            state => return Err(OrmError::protocol(operation, state)),
        }
        Ok(())
    }

    /// Add a select-list column. Identifiers in `expr` are quoted.
    pub fn select(&mut self, expr: &str) -> OrmResult<&mut Self> {
        self.begin_column("select")?;
        self.push_expr(expr);
        Ok(self)
    }

    /// Add several select-list columns.
    pub fn select_cols(&mut self, exprs: &[&str]) -> OrmResult<&mut Self> {
        for expr in exprs {
            self.select(expr)?;
        }
        Ok(self)
    }

    /// Add a select-list column with an alias.
    pub fn select_as(&mut self, expr: &str, alias: &str) -> OrmResult<&mut Self> {
        self.begin_column("select_as")?;
        self.push_expr(expr);
        self.buf.push_str(" AS ");
        self.push_ident(alias);
        Ok(self)
    }

    /// Add a select-list entry copied verbatim.
    pub fn select_raw(&mut self, sql: &str) -> OrmResult<&mut Self> {
        self.begin_column("select_raw")?;
        self.buf.push_str(sql);
        Ok(self)
    }

    /// Add `COUNT(*)` to the select list.
    pub fn select_count(&mut self) -> OrmResult<&mut Self> {
        self.select_raw("COUNT(*)")
    }

    /// Add the dialect's last-generated-identity expression to the select list.
    pub fn select_last_insert_id(&mut self) -> OrmResult<&mut Self> {
        let expr = self.config.dialect.last_insert_id();
        self.select_raw(expr)
    }

    /// Add a parenthesized sub-select as one column.
    pub fn select_subquery<F>(&mut self, alias: &str, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.begin_column("select_subquery")?;
        self.nested("select_subquery", true, build)?;
        self.buf.push_str(" AS ");
        self.push_ident(alias);
        Ok(self)
    }

    // ==================== FROM ====================

    fn begin_from(&mut self, operation: &'static str) -> OrmResult<()> {
        self.expect(operation, &[State::SelectList])?;
        self.frame.columns_end = Some(self.buf.len());
        self.buf.push_str(" FROM ");
        self.frame.state = State::FromClause;
        Ok(())
    }

    /// Close the select list with `FROM <table>`.
    pub fn from(&mut self, table: &str) -> OrmResult<&mut Self> {
        self.begin_from("from")?;
        self.push_ident(table);
        Ok(self)
    }

    /// Close the select list with `FROM <table> <alias>`.
    pub fn from_as(&mut self, table: &str, alias: &str) -> OrmResult<&mut Self> {
        self.begin_from("from_as")?;
        self.push_ident(table);
        self.buf.push(' ');
        self.push_ident(alias);
        Ok(self)
    }

    /// Close the select list with a derived table: `FROM (<sub>) <alias>`.
    pub fn from_subquery<F>(&mut self, alias: &str, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.begin_from("from_subquery")?;
        self.nested("from_subquery", true, build)?;
        self.buf.push(' ');
        self.push_ident(alias);
        Ok(self)
    }

    /// Emit the `FROM` a select list left implicit, using the bound entity.
    pub(crate) fn implicit_from(&mut self, operation: &'static str) -> OrmResult<()> {
        let table = match &self.frame.entity {
            Some(entity) => entity.table.clone(),
            None => return Err(OrmError::protocol(operation, self.frame.state)),
        };
        self.begin_from(operation)?;
        self.push_ident(&table);
        Ok(())
    }

    // ==================== JOIN ====================

    fn begin_join(&mut self, operation: &'static str, kind: JoinKind) -> OrmResult<()> {
        if self.frame.state == State::SelectList && self.frame.entity.is_some() {
            self.implicit_from(operation)?;
        }
        self.expect(operation, JOINABLE)?;
        self.buf.push('\n');
        self.buf.push_str(kind.keyword());
        self.buf.push(' ');
        Ok(())
    }

    /// Add a join source. Follow with [`Statement::join_on`] unless `kind` is
    /// [`JoinKind::Cross`].
    pub fn join(&mut self, kind: JoinKind, table: &str, alias: Option<&str>) -> OrmResult<&mut Self> {
        self.begin_join("join", kind)?;
        self.push_ident(table);
        if let Some(alias) = alias {
            self.buf.push(' ');
            self.push_ident(alias);
        }
        self.frame.state = State::JoinHead;
        Ok(self)
    }

    /// Add a derived table as join source.
    pub fn join_subquery<F>(&mut self, kind: JoinKind, alias: &str, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.begin_join("join_subquery", kind)?;
        self.nested("join_subquery", true, build)?;
        self.buf.push(' ');
        self.push_ident(alias);
        self.frame.state = State::JoinHead;
        Ok(self)
    }

    /// Add an equality to the current join's `ON` predicate.
    pub fn join_on(&mut self, left: &str, right: &str) -> OrmResult<&mut Self> {
        self.begin_on("join_on")?;
        self.push_expr(left);
        self.buf.push('=');
        self.push_expr(right);
        Ok(self)
    }

    /// Add a templated expression to the current join's `ON` predicate.
    pub fn join_on_expr(
        &mut self,
        template: &str,
        args: &[&dyn crate::value::ToValue],
    ) -> OrmResult<&mut Self> {
        self.begin_on("join_on_expr")?;
        self.push_template(template, args)?;
        Ok(self)
    }

    fn begin_on(&mut self, operation: &'static str) -> OrmResult<()> {
        match self.frame.state {
            State::JoinHead => self.buf.push_str(" ON "),
            State::JoinOnClause => self.buf.push_str(" AND "),
            state => return Err(OrmError::protocol(operation, state)),
        }
        self.frame.state = State::JoinOnClause;
        Ok(())
    }

    // ==================== ORDER BY / LIMIT ====================

    fn begin_order(&mut self, operation: &'static str) -> OrmResult<()> {
        if self.frame.state == State::SelectList {
            self.implicit_from(operation)?;
        }
        match self.frame.state {
            State::FromClause
            | State::JoinHead
            | State::JoinOnClause
            | State::WhereClause
            | State::UpdateHead
            | State::SetList
            | State::DeleteHead => self.buf.push_str(" ORDER BY "),
            State::OrderByList => self.buf.push(','),
            state => return Err(OrmError::protocol(operation, state)),
        }
        self.frame.state = State::OrderByList;
        Ok(())
    }

    /// Add an ascending sort key.
    pub fn order_by(&mut self, expr: &str) -> OrmResult<&mut Self> {
        self.begin_order("order_by")?;
        self.push_expr(expr);
        Ok(self)
    }

    /// Add a descending sort key.
    pub fn order_by_desc(&mut self, expr: &str) -> OrmResult<&mut Self> {
        self.begin_order("order_by_desc")?;
        self.push_expr(expr);
        self.buf.push_str(" DESC");
        Ok(self)
    }

    fn check_limit(&self, operation: &'static str) -> OrmResult<()> {
        match self.frame.state {
            State::Start | State::WhereConditionPending | State::WhereOrGroup => {
                Err(OrmError::protocol(operation, self.frame.state))
            }
            _ => Ok(()),
        }
    }

    /// Append `LIMIT n`. The state is unchanged.
    pub fn limit(&mut self, n: u64) -> OrmResult<&mut Self> {
        self.check_limit("limit")?;
        self.buf.push_str(" LIMIT ");
        self.buf.push_str(&n.to_string());
        Ok(self)
    }

    /// Append `LIMIT n OFFSET offset`. The state is unchanged.
    pub fn limit_offset(&mut self, n: u64, offset: u64) -> OrmResult<&mut Self> {
        self.check_limit("limit_offset")?;
        self.buf.push_str(" LIMIT ");
        self.buf.push_str(&n.to_string());
        self.buf.push_str(" OFFSET ");
        self.buf.push_str(&offset.to_string());
        Ok(self)
    }
}
