//! Dialect-aware SQL compiler.
//!
//! Turns a [`Query`] into a [`CompiledStatement`] for one dialect. SELECT,
//! INSERT and DELETE go through the general builder; UPDATE assembles its
//! own SET list so that duplicate assignments collapse and
//! `LastModifiedDate` is always written exactly once.
//!
//! Clauses are rendered with `?` markers first and the markers are named
//! with the dialect's placeholder syntax as the last step, so binding order
//! always follows the order of appearance in the SQL text.

use std::sync::Arc;

use chrono::Local;

use crate::cache::CachingDirective;
use crate::core::identifier::{unquote, validate_identifier};
use crate::core::schema::{ID_COLUMN, LAST_MODIFIED_DATE_COLUMN};
use crate::core::statement::CompiledStatement;
use crate::core::traits::{Dialect, SelectQueryOptions};
use crate::core::value::SqlValue;
use crate::error::{BridgeError, Result};
use crate::query::{Condition, Conjunction, Direction, Operator, Query, QueryAction, SetClause};

/// A compiled statement plus the caching directive stripped from its query.
#[derive(Debug, Clone)]
pub struct CompileInfo {
    pub statement: CompiledStatement,
    pub caching: Option<CachingDirective>,
}

/// Compiles queries for one dialect.
#[derive(Debug, Clone)]
pub struct Compiler {
    dialect: Arc<dyn Dialect>,
    legacy_pagination: bool,
}

impl Compiler {
    /// `legacy_pagination` selects the ROW_NUMBER emulation on engines that
    /// predate OFFSET/FETCH.
    pub fn new(dialect: Arc<dyn Dialect>, legacy_pagination: bool) -> Self {
        Self {
            dialect,
            legacy_pagination,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn legacy_pagination(&self) -> bool {
        self.legacy_pagination
    }

    /// Compile a query according to its action.
    ///
    /// The caching directive is removed from the query and returned beside
    /// the statement; it never influences the SQL.
    pub fn compile(&self, query: Query) -> Result<CompileInfo> {
        let (query, caching) = query.take_caching();
        let table = target_table(&query)?;

        let mut values = Vec::new();
        let sql = match query.action() {
            QueryAction::Select => self.render_select(&query, table, None, &mut values),
            QueryAction::Insert => self.render_insert(&query, table, &mut values)?,
            QueryAction::Update => self.render_update(&query, table, &mut values),
            QueryAction::Delete => self.render_delete(&query, table, &mut values),
        };

        Ok(CompileInfo {
            statement: self.finish(&sql, values),
            caching,
        })
    }

    /// `SELECT COUNT(1)`; the caller tests the result for > 0.
    pub fn compile_exists(&self, query: Query) -> Result<CompileInfo> {
        self.compile_aggregate(query, "COUNT(1)".to_string())
    }

    /// `SELECT COUNT(*)`.
    pub fn compile_count(&self, query: Query) -> Result<CompileInfo> {
        self.compile_aggregate(query, "COUNT(*)".to_string())
    }

    /// `SELECT SUM(col)` over the query's single selected column.
    pub fn compile_sum(&self, query: Query) -> Result<CompileInfo> {
        let column = self.aggregation_target(&query, "sum")?;
        self.compile_aggregate(query, format!("SUM({})", column))
    }

    /// `SELECT MAX(col)` over the query's single selected column.
    pub fn compile_max(&self, query: Query) -> Result<CompileInfo> {
        let column = self.aggregation_target(&query, "max")?;
        self.compile_aggregate(query, format!("MAX({})", column))
    }

    /// Compile an INSERT whose first result value is the new identity.
    pub fn compile_insert_returning_id(&self, query: Query) -> Result<CompileInfo> {
        if query.action() != QueryAction::Insert {
            return Err(BridgeError::Config(
                "insert returning id requires an insert query".to_string(),
            ));
        }
        let mut info = self.compile(query)?;
        info.statement.sql = self
            .dialect
            .insert_returning_id(&info.statement.sql, ID_COLUMN);
        Ok(info)
    }

    fn compile_aggregate(&self, query: Query, expression: String) -> Result<CompileInfo> {
        let (query, caching) = query.take_caching();
        let query = query.clear_order().as_select();
        let table = target_table(&query)?;

        let mut values = Vec::new();
        let sql = self.render_select(&query, table, Some(expression), &mut values);
        Ok(CompileInfo {
            statement: self.finish(&sql, values),
            caching,
        })
    }

    fn aggregation_target(&self, query: &Query, operation: &'static str) -> Result<String> {
        match query.columns() {
            [] => Err(BridgeError::AggregationTargetMissing { operation }),
            [column] => {
                validate_identifier(column)?;
                Ok(self.dialect.quote_ident(column))
            }
            columns => Err(BridgeError::Config(format!(
                "{} takes one column, got {}",
                operation,
                columns.len()
            ))),
        }
    }

    fn finish(&self, sql: &str, values: Vec<SqlValue>) -> CompiledStatement {
        CompiledStatement::raw(self.dialect.as_ref(), sql, values)
    }

    // ----- rendering -----

    fn render_select(
        &self,
        query: &Query,
        table: &str,
        aggregate: Option<String>,
        values: &mut Vec<SqlValue>,
    ) -> String {
        let columns = match aggregate {
            Some(expression) => expression,
            None => self.select_list(query),
        };
        let opts = SelectQueryOptions {
            table: table.to_string(),
            columns,
            where_clause: self.render_where(query.conditions(), values),
            order_by: self.order_list(query),
            offset: query.offset_value(),
            limit: query.limit_value(),
            legacy_pagination: self.legacy_pagination,
        };
        self.dialect.build_select_query(&opts)
    }

    fn render_insert(
        &self,
        query: &Query,
        table: &str,
        values: &mut Vec<SqlValue>,
    ) -> Result<String> {
        let pairs = query.insert_values();
        if pairs.is_empty() {
            return Err(BridgeError::Config(format!(
                "insert into {} has no values",
                table
            )));
        }
        let mut columns = Vec::with_capacity(pairs.len());
        for (column, value) in pairs {
            validate_identifier(column)?;
            columns.push(self.dialect.quote_ident(column));
            values.push(value.clone());
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote_ident(table),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        ))
    }

    fn render_delete(&self, query: &Query, table: &str, values: &mut Vec<SqlValue>) -> String {
        let mut sql = format!("DELETE FROM {}", self.dialect.quote_ident(table));
        if let Some(predicate) = self.render_where(query.conditions(), values) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        sql
    }

    /// UPDATE with a deduplicated SET list.
    ///
    /// Assignments are kept in order and the first assignment to a column
    /// (compared case-insensitively) wins. `LastModifiedDate = now` is
    /// appended unless the list already assigns it. Bindings follow the SQL:
    /// SET values first, then WHERE values.
    fn render_update(&self, query: &Query, table: &str, values: &mut Vec<SqlValue>) -> String {
        let mut seen: Vec<String> = Vec::new();
        let mut assignments: Vec<String> = Vec::new();

        for clause in query.sets() {
            let target = set_target(clause);
            if seen.iter().any(|s| s.eq_ignore_ascii_case(&target)) {
                continue;
            }
            match clause {
                SetClause::Value { column, value } => {
                    assignments.push(format!("{} = ?", self.dialect.quote_ident(column)));
                    values.push(value.clone());
                }
                SetClause::Raw {
                    expression,
                    bindings,
                } => {
                    assignments.push(self.dialect.wrap_identifiers(expression));
                    values.extend(bindings.iter().cloned());
                }
            }
            seen.push(target);
        }

        if !seen
            .iter()
            .any(|s| s.eq_ignore_ascii_case(LAST_MODIFIED_DATE_COLUMN))
        {
            assignments.push(format!(
                "{} = ?",
                self.dialect.quote_ident(LAST_MODIFIED_DATE_COLUMN)
            ));
            values.push(SqlValue::DateTime(Local::now().naive_local()));
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.dialect.quote_ident(table),
            assignments.join(", ")
        );
        if let Some(predicate) = self.render_where(query.conditions(), values) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        sql
    }

    fn select_list(&self, query: &Query) -> String {
        let mut items: Vec<String> = query
            .columns()
            .iter()
            .map(|c| self.dialect.quote_ident(c))
            .collect();
        items.extend(
            query
                .raw_columns()
                .iter()
                .map(|r| self.dialect.wrap_identifiers(r)),
        );
        if items.is_empty() {
            "*".to_string()
        } else {
            items.join(", ")
        }
    }

    fn order_list(&self, query: &Query) -> Option<String> {
        if query.orders().is_empty() {
            return None;
        }
        Some(
            query
                .orders()
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", self.dialect.quote_ident(&o.column), dir)
                })
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Render top-level conditions joined with AND.
    fn render_where(&self, conditions: &[Condition], values: &mut Vec<SqlValue>) -> Option<String> {
        if conditions.is_empty() {
            return None;
        }
        Some(
            conditions
                .iter()
                .map(|c| self.render_condition(c, values))
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }

    fn render_condition(&self, condition: &Condition, values: &mut Vec<SqlValue>) -> String {
        match condition {
            Condition::Compare { column, op, value } => {
                let column = self.dialect.quote_ident(column);
                match (op, value.is_null()) {
                    (Operator::Eq, true) => format!("{} IS NULL", column),
                    (Operator::NotEq, true) => format!("{} IS NOT NULL", column),
                    _ => {
                        values.push(value.clone());
                        format!("{} {} ?", column, op.as_sql())
                    }
                }
            }
            Condition::In { column, values: list } => {
                if list.is_empty() {
                    return "1 = 0".to_string();
                }
                values.extend(list.iter().cloned());
                format!(
                    "{} IN ({})",
                    self.dialect.quote_ident(column),
                    vec!["?"; list.len()].join(", ")
                )
            }
            Condition::Null { column } => format!("{} IS NULL", self.dialect.quote_ident(column)),
            Condition::Raw { sql, bindings } => {
                values.extend(bindings.iter().cloned());
                format!("({})", self.dialect.wrap_identifiers(sql))
            }
            Condition::Group {
                conjunction,
                conditions,
            } => {
                if conditions.is_empty() {
                    return match conjunction {
                        Conjunction::And => "1 = 1".to_string(),
                        Conjunction::Or => "1 = 0".to_string(),
                    };
                }
                let parts: Vec<String> = conditions
                    .iter()
                    .map(|c| self.render_condition(c, values))
                    .collect();
                format!("({})", parts.join(conjunction.as_sql()))
            }
            Condition::Not(inner) => format!("NOT ({})", self.render_condition(inner, values)),
        }
    }
}

fn target_table(query: &Query) -> Result<&str> {
    let table = query
        .table_name()
        .ok_or_else(|| BridgeError::Config("query has no target table".to_string()))?;
    validate_identifier(table)?;
    Ok(table)
}

/// Column an assignment writes to, used for deduplication.
fn set_target(clause: &SetClause) -> String {
    match clause {
        SetClause::Value { column, .. } => column.clone(),
        SetClause::Raw { expression, .. } => {
            let lhs = expression.split('=').next().unwrap_or(expression);
            unquote(lhs).to_string()
        }
    }
}
