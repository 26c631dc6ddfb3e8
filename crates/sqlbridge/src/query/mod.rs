//! Dialect-neutral query description.
//!
//! A [`Query`] is an immutable value: every builder method consumes the
//! query and returns a new one, so a base query can be cloned and reused
//! against several tables without aliasing.
//!
//! ```
//! use sqlbridge::query::{Operator, Query};
//!
//! let base = Query::new().where_op("Hits", Operator::Gt, 10).order_by_desc("Id");
//! let posts = base.clone().with_table("Posts").limit(20);
//! let pages = base.with_table("Pages");
//! assert_eq!(posts.table_name(), Some("Posts"));
//! assert_eq!(pages.table_name(), Some("Pages"));
//! ```

mod condition;

pub use condition::{Condition, Conjunction, Operator};

use serde::Serialize;

use crate::cache::{CacheEntryOptions, CachingDirective};
use crate::core::value::SqlValue;

/// Statement kind a query compiles to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum QueryAction {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Asc,
    Desc,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// One UPDATE assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SetClause {
    /// `column = value`
    Value { column: String, value: SqlValue },
    /// A raw assignment such as `[Hits] = [Hits] + 1`; `[name]` markers are
    /// quoted by the dialect and `?` markers take `bindings` in order.
    Raw {
        expression: String,
        bindings: Vec<SqlValue>,
    },
}

/// Dialect-neutral description of one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    table: Option<String>,
    action: QueryAction,
    columns: Vec<String>,
    raw_columns: Vec<String>,
    conditions: Vec<Condition>,
    orders: Vec<Order>,
    offset: Option<u64>,
    limit: Option<u64>,
    sets: Vec<SetClause>,
    values: Vec<(String, SqlValue)>,
    #[serde(skip)]
    caching: Option<CachingDirective>,
}

impl Query {
    /// An empty select with no table; the repository supplies one.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty select against `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// Shorthand for `Query::new().where_eq(column, value)`.
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new().where_eq(column, value)
    }

    /// The same query against another table.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    // ----- filters -----

    #[must_use]
    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    #[must_use]
    pub fn where_op(
        self,
        column: impl Into<String>,
        op: Operator,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.where_condition(Condition::compare(column, op, value))
    }

    #[must_use]
    pub fn where_in<V: Into<SqlValue>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_condition(Condition::is_in(column, values))
    }

    #[must_use]
    pub fn where_not_in<V: Into<SqlValue>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_condition(Condition::not(Condition::is_in(column, values)))
    }

    #[must_use]
    pub fn where_null(self, column: impl Into<String>) -> Self {
        self.where_condition(Condition::null(column))
    }

    #[must_use]
    pub fn where_not_null(self, column: impl Into<String>) -> Self {
        self.where_condition(Condition::not(Condition::null(column)))
    }

    #[must_use]
    pub fn where_like(self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.where_op(column, Operator::Like, pattern.into())
    }

    /// Raw predicate; `[name]` markers are quoted, `?` markers take `bindings`.
    #[must_use]
    pub fn where_raw(self, sql: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        self.where_condition(Condition::raw(sql, bindings))
    }

    // ----- ordering and paging -----

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::Asc,
        });
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::Desc,
        });
        self
    }

    #[must_use]
    pub fn clear_order(mut self) -> Self {
        self.orders.clear();
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    // ----- selection -----

    /// Replace the selected columns.
    #[must_use]
    pub fn select<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self.raw_columns.clear();
        self
    }

    /// Add a raw select expression (`[name]` markers are quoted).
    #[must_use]
    pub fn select_raw(mut self, expression: impl Into<String>) -> Self {
        self.raw_columns.push(expression.into());
        self
    }

    #[must_use]
    pub fn clear_select(mut self) -> Self {
        self.columns.clear();
        self.raw_columns.clear();
        self
    }

    // ----- writes -----

    /// Add a `column = value` assignment and mark the query as an UPDATE.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.sets.push(SetClause::Value {
            column: column.into(),
            value: value.into(),
        });
        self.action = QueryAction::Update;
        self
    }

    /// Add a raw assignment and mark the query as an UPDATE.
    #[must_use]
    pub fn set_raw(mut self, expression: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        self.sets.push(SetClause::Raw {
            expression: expression.into(),
            bindings,
        });
        self.action = QueryAction::Update;
        self
    }

    /// Drop every UPDATE assignment.
    #[must_use]
    pub fn clear_sets(mut self) -> Self {
        self.sets.clear();
        self
    }

    /// Turn the query into an INSERT of the given column values.
    #[must_use]
    pub fn as_insert<S: Into<String>>(
        mut self,
        values: impl IntoIterator<Item = (S, SqlValue)>,
    ) -> Self {
        self.values = values.into_iter().map(|(c, v)| (c.into(), v)).collect();
        self.action = QueryAction::Insert;
        self
    }

    #[must_use]
    pub fn as_update(mut self) -> Self {
        self.action = QueryAction::Update;
        self
    }

    #[must_use]
    pub fn as_delete(mut self) -> Self {
        self.action = QueryAction::Delete;
        self
    }

    #[must_use]
    pub fn as_select(mut self) -> Self {
        self.action = QueryAction::Select;
        self
    }

    // ----- caching -----

    /// Serve results from the cache under `key`, storing them on a miss.
    #[must_use]
    pub fn caching_read_through(mut self, key: impl Into<String>, options: CacheEntryOptions) -> Self {
        self.caching = Some(CachingDirective::read_through(key, options));
        self
    }

    /// Remove `key` from the cache before the statement runs.
    #[must_use]
    pub fn caching_invalidate(mut self, key: impl Into<String>) -> Self {
        self.caching = Some(CachingDirective::invalidate(key));
        self
    }

    /// Split off the caching directive.
    pub fn take_caching(mut self) -> (Self, Option<CachingDirective>) {
        let directive = self.caching.take();
        (self, directive)
    }

    // ----- accessors -----

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn action(&self) -> QueryAction {
        self.action
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn raw_columns(&self) -> &[String] {
        &self.raw_columns
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn sets(&self) -> &[SetClause] {
        &self.sets
    }

    pub fn insert_values(&self) -> &[(String, SqlValue)] {
        &self.values
    }

    pub fn caching(&self) -> Option<&CachingDirective> {
        self.caching.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_returns_new_values() {
        let base = Query::table("Posts").where_eq("SiteId", 1);
        let paged = base.clone().offset(20).limit(10);
        let other = base.clone().with_table("Pages");

        assert_eq!(base.offset_value(), None);
        assert_eq!(paged.offset_value(), Some(20));
        assert_eq!(base.table_name(), Some("Posts"));
        assert_eq!(other.table_name(), Some("Pages"));
        assert_eq!(other.conditions(), base.conditions());
    }

    #[test]
    fn test_set_marks_update() {
        let q = Query::eq("Id", 3).set("Title", "x").set_raw("[Hits] = [Hits] + 1", vec![]);
        assert_eq!(q.action(), QueryAction::Update);
        assert_eq!(q.sets().len(), 2);
        assert!(q.clone().clear_sets().sets().is_empty());
    }

    #[test]
    fn test_select_replaces_columns() {
        let q = Query::new().select(["A", "B"]).select(["C"]);
        assert_eq!(q.columns(), ["C".to_string()]);
        assert!(q.clone().select_raw("COUNT(1)").raw_columns().len() == 1);
        assert!(q.clear_select().columns().is_empty());
    }

    #[test]
    fn test_take_caching() {
        let q = Query::table("Posts").caching_invalidate("k");
        assert!(q.caching().is_some());
        let (q, directive) = q.take_caching();
        assert!(q.caching().is_none());
        assert_eq!(directive.unwrap().key, "k");
    }

    #[test]
    fn test_as_insert() {
        let q = Query::table("Posts").as_insert([("Title", SqlValue::from("a"))]);
        assert_eq!(q.action(), QueryAction::Insert);
        assert_eq!(q.insert_values()[0].0, "Title");
    }
}
