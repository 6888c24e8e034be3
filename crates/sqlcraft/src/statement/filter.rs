//! `WHERE` conditions and OR groups.

use super::{State, Statement, to_values};
use crate::error::{OrmError, OrmResult};
use crate::value::{ToValue, Value};

/// Comparison operator completing a pending condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl CompareOp {
    /// Operator text as written between column and operand.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => " LIKE ",
            Self::NotLike => " NOT LIKE ",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Escaped literal.
    Literal(Value),
    /// A finished statement, rendered in parentheses.
    Subquery(super::Statement),
    /// Trusted template with escaped arguments.
    Expr { template: String, args: Vec<Value> },
}

impl Operand {
    /// Literal operand.
    pub fn value(value: impl ToValue) -> Self {
        Self::Literal(value.to_value())
    }

    /// Sub-select operand.
    pub fn subquery(statement: Statement) -> Self {
        Self::Subquery(statement)
    }

    /// Template operand, e.g. `Operand::expr("NOW() - INTERVAL {0} DAY", &[&7])`.
    pub fn expr(template: impl Into<String>, args: &[&dyn ToValue]) -> Self {
        Self::Expr {
            template: template.into(),
            args: to_values(args),
        }
    }
}

const WHERE_OPENERS: &[State] = &[
    State::FromClause,
    State::JoinHead,
    State::JoinOnClause,
    State::SetList,
    State::DeleteHead,
];

impl Statement {
    /// Write the keyword introducing the next condition.
    fn begin_where(&mut self, operation: &'static str) -> OrmResult<()> {
        if self.frame.state == State::SelectList {
            self.implicit_from(operation)?;
        }
        match self.frame.state {
            State::WhereClause => self.buf.push_str(" AND "),
            State::WhereOrGroup => self.buf.push_str(" OR "),
            state if WHERE_OPENERS.contains(&state) => self.buf.push_str(" WHERE "),
            state => return Err(OrmError::protocol(operation, state)),
        }
        Ok(())
    }

    fn end_condition(&mut self) {
        self.buf.push(')');
        self.frame.state = if self.frame.in_or_group {
            State::WhereOrGroup
        } else {
            State::WhereClause
        };
    }

    /// Start a condition on `column`; complete it with a comparison such as
    /// [`Statement::eq`].
    pub fn where_col(&mut self, column: &str) -> OrmResult<&mut Self> {
        self.begin_where("where_col")?;
        self.buf.push('(');
        self.frame.condition_start = self.buf.len();
        self.push_expr(column);
        self.frame.state = State::WhereConditionPending;
        Ok(self)
    }

    /// Add a whole condition from a template: `(<template>)`.
    pub fn where_expr(&mut self, template: &str, args: &[&dyn ToValue]) -> OrmResult<&mut Self> {
        self.begin_where("where_expr")?;
        self.buf.push('(');
        self.push_template(template, args)?;
        self.end_condition();
        Ok(self)
    }

    /// Add `EXISTS (<sub>)` as a condition.
    pub fn where_exists<F>(&mut self, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.begin_where("where_exists")?;
        self.buf.push_str("(EXISTS ");
        self.nested("where_exists", true, build)?;
        self.end_condition();
        Ok(self)
    }

    /// Open an OR group: `(0 OR c1 OR c2 ...)`.
    pub fn where_or_group(&mut self) -> OrmResult<&mut Self> {
        if self.frame.state == State::SelectList {
            self.implicit_from("where_or_group")?;
        }
        match self.frame.state {
            State::WhereClause => self.buf.push_str(" AND (0"),
            state if WHERE_OPENERS.contains(&state) => self.buf.push_str(" WHERE (0"),
            state => return Err(OrmError::protocol("where_or_group", state)),
        }
        self.frame.in_or_group = true;
        self.frame.state = State::WhereOrGroup;
        Ok(self)
    }

    /// Close the OR group opened by [`Statement::where_or_group`].
    pub fn end_where_or_group(&mut self) -> OrmResult<&mut Self> {
        self.expect("end_where_or_group", &[State::WhereOrGroup])?;
        self.buf.push(')');
        self.frame.in_or_group = false;
        self.frame.state = State::WhereClause;
        Ok(self)
    }

    // ==================== Completing a condition ====================

    /// Complete the pending condition with `op` and `operand`.
    pub fn compare(&mut self, op: CompareOp, operand: Operand) -> OrmResult<&mut Self> {
        self.expect("compare", &[State::WhereConditionPending])?;
        match (op, &operand) {
            (CompareOp::Eq, Operand::Literal(Value::Null)) => self.buf.push_str(" IS NULL"),
            (CompareOp::Ne, Operand::Literal(Value::Null)) => self.buf.push_str(" IS NOT NULL"),
            _ => {
                self.buf.push_str(op.as_sql());
                self.push_operand(operand)?;
            }
        }
        self.end_condition();
        Ok(self)
    }

    fn push_operand(&mut self, operand: Operand) -> OrmResult<()> {
        match operand {
            Operand::Literal(value) => self.push_literal(&value),
            Operand::Subquery(sub) => {
                if matches!(
                    sub.state(),
                    State::WhereConditionPending | State::WhereOrGroup | State::Start
                ) {
                    return Err(OrmError::protocol("compare", sub.state()));
                }
                self.buf.push('(');
                self.buf.push_str(sub.as_str());
                self.buf.push(')');
                Ok(())
            }
            Operand::Expr { template, args } => {
                crate::escape::interpolate(
                    &mut self.buf,
                    self.config.dialect.as_ref(),
                    &template,
                    &args,
                )
            }
        }
    }

    /// `= value` (or `IS NULL` for a null value).
    pub fn eq(&mut self, value: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Eq, Operand::value(value))
    }

    /// `<> value` (or `IS NOT NULL` for a null value).
    pub fn ne(&mut self, value: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Ne, Operand::value(value))
    }

    /// `< value`.
    pub fn lt(&mut self, value: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Lt, Operand::value(value))
    }

    /// `<= value`.
    pub fn le(&mut self, value: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Le, Operand::value(value))
    }

    /// `> value`.
    pub fn gt(&mut self, value: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Gt, Operand::value(value))
    }

    /// `>= value`.
    pub fn ge(&mut self, value: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Ge, Operand::value(value))
    }

    /// `LIKE pattern`.
    pub fn like(&mut self, pattern: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Like, Operand::value(pattern))
    }

    /// `NOT LIKE pattern`.
    pub fn not_like(&mut self, pattern: impl ToValue) -> OrmResult<&mut Self> {
        self.compare(CompareOp::NotLike, Operand::value(pattern))
    }

    /// `IS NULL`.
    pub fn is_null(&mut self) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Eq, Operand::Literal(Value::Null))
    }

    /// `IS NOT NULL`.
    pub fn is_not_null(&mut self) -> OrmResult<&mut Self> {
        self.compare(CompareOp::Ne, Operand::Literal(Value::Null))
    }

    /// `BETWEEN low AND high`.
    pub fn between(&mut self, low: impl ToValue, high: impl ToValue) -> OrmResult<&mut Self> {
        self.expect("between", &[State::WhereConditionPending])?;
        self.buf.push_str(" BETWEEN ");
        self.push_literal(&low.to_value())?;
        self.buf.push_str(" AND ");
        self.push_literal(&high.to_value())?;
        self.end_condition();
        Ok(self)
    }

    /// `IN (v1,v2,...)`. An empty list renders `IN (NULL)`, which matches nothing.
    pub fn in_list<I>(&mut self, values: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.membership("in_list", false, values)
    }

    /// `NOT IN (v1,v2,...)`. An empty list matches every row and renders `1=1`
    /// in place of the comparison.
    pub fn not_in_list<I>(&mut self, values: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.membership("not_in_list", true, values)
    }

    fn membership<I>(&mut self, operation: &'static str, negated: bool, values: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.expect(operation, &[State::WhereConditionPending])?;
        let values: Vec<Value> = values.into_iter().map(|v| v.to_value()).collect();
        if values.is_empty() && negated {
            // `x NOT IN (NULL)` is never true; replace the column with a tautology.
            self.buf.truncate(self.frame.condition_start);
            self.buf.push_str("1=1");
            self.end_condition();
            return Ok(self);
        }
        self.buf.push_str(if negated { " NOT IN (" } else { " IN (" });
        if values.is_empty() {
            self.buf.push_str("NULL");
        } else {
            self.push_literals(&values)?;
        }
        self.buf.push(')');
        self.end_condition();
        Ok(self)
    }

    /// `IN (<sub>)`.
    pub fn in_subquery<F>(&mut self, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.expect("in_subquery", &[State::WhereConditionPending])?;
        self.buf.push_str(" IN ");
        self.nested("in_subquery", true, build)?;
        self.end_condition();
        Ok(self)
    }

    /// Compare against a sub-select built in place: `<op> (<sub>)`.
    pub fn compare_subquery<F>(&mut self, op: CompareOp, build: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Statement) -> OrmResult<()>,
    {
        self.expect("compare_subquery", &[State::WhereConditionPending])?;
        self.buf.push_str(op.as_sql());
        self.nested("compare_subquery", true, build)?;
        self.end_condition();
        Ok(self)
    }
}
