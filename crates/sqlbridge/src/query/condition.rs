//! WHERE clause predicates.

use serde::Serialize;

use crate::core::value::SqlValue;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

/// How the members of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => " AND ",
            Conjunction::Or => " OR ",
        }
    }
}

/// A predicate tree. Top-level conditions on a query are joined with AND.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Condition {
    Compare {
        column: String,
        op: Operator,
        value: SqlValue,
    },
    In {
        column: String,
        values: Vec<SqlValue>,
    },
    Null {
        column: String,
    },
    Raw {
        sql: String,
        bindings: Vec<SqlValue>,
    },
    Group {
        conjunction: Conjunction,
        conditions: Vec<Condition>,
    },
    Not(Box<Condition>),
}

impl Condition {
    pub fn compare(column: impl Into<String>, op: Operator, value: impl Into<SqlValue>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Operator::Eq, value)
    }

    pub fn is_in<V: Into<SqlValue>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn null(column: impl Into<String>) -> Self {
        Condition::Null {
            column: column.into(),
        }
    }

    pub fn raw(sql: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            bindings,
        }
    }

    /// Every member must hold.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Group {
            conjunction: Conjunction::And,
            conditions: conditions.into_iter().collect(),
        }
    }

    /// At least one member must hold.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Group {
            conjunction: Conjunction::Or,
            conditions: conditions.into_iter().collect(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }
}
