//! Core traits for dialect-aware data access.
//!
//! - [`Dialect`]: per-engine SQL syntax strategy
//! - [`Connection`]: one open connection able to run compiled statements
//! - [`ConnectionFactory`]: opens connections for a dialect and connection string
//!
//! # Design Patterns
//!
//! - **Strategy**: one `Dialect` implementation per engine, selected once per `Database`
//! - **Abstract Factory**: `ConnectionFactory` hides the driver from the repository
//! - **Template Method**: default `Dialect` methods cover the ANSI behavior and
//!   engines override only what differs

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

use super::schema::{CanonicalColumnType, TableColumn};
use super::statement::CompiledStatement;
use super::value::{Row, SqlValue};

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectId {
    MySql,
    SqlServer,
    PostgreSql,
    Oracle,
    Sqlite,
}

impl DialectId {
    /// All supported dialects.
    pub const ALL: [DialectId; 5] = [
        DialectId::MySql,
        DialectId::SqlServer,
        DialectId::PostgreSql,
        DialectId::Oracle,
        DialectId::Sqlite,
    ];

    /// Parse a dialect from a configuration name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DialectId::MySql),
            "sqlserver" | "mssql" | "sql_server" => Ok(DialectId::SqlServer),
            "postgresql" | "postgres" | "pg" => Ok(DialectId::PostgreSql),
            "oracle" => Ok(DialectId::Oracle),
            "sqlite" => Ok(DialectId::Sqlite),
            other => Err(BridgeError::Config(format!(
                "Unknown database type: '{}'. Supported types: mysql, sqlserver, postgresql, oracle, sqlite",
                other
            ))),
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            DialectId::MySql => "mysql",
            DialectId::SqlServer => "sqlserver",
            DialectId::PostgreSql => "postgresql",
            DialectId::Oracle => "oracle",
            DialectId::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Rendered pieces of a SELECT that a dialect assembles and paginates.
///
/// Clause strings are already rendered with identifier quoting and contain
/// `?` markers for bound values; the compiler names the markers afterwards.
#[derive(Debug, Clone, Default)]
pub struct SelectQueryOptions {
    /// Unquoted table name.
    pub table: String,
    /// Rendered select list (`*`, a column list or an aggregate).
    pub columns: String,
    /// Rendered predicate without the `WHERE` keyword.
    pub where_clause: Option<String>,
    /// Rendered ordering without the `ORDER BY` keyword.
    pub order_by: Option<String>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Maximum rows to return.
    pub limit: Option<u64>,
    /// Engine predates native OFFSET/FETCH support.
    pub legacy_pagination: bool,
}

impl SelectQueryOptions {
    /// `SELECT <cols> FROM <table> [WHERE ..] [ORDER BY ..]` without pagination.
    pub fn base_sql(&self, dialect: &dyn Dialect) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.columns,
            dialect.quote_ident(&self.table)
        );
        if let Some(ref w) = self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        if let Some(ref o) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(o);
        }
        sql
    }

    /// True when an offset or limit is requested.
    pub fn is_paged(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}

/// SQL dialect strategy for a database engine.
///
/// Everything that differs between engines lives behind this trait:
/// identifier quoting, placeholders, pagination, type names, identity
/// syntax and catalog queries. Catalog queries are returned as SQL with `?`
/// markers plus the values to bind.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// The engine this strategy renders for.
    fn id(&self) -> DialectId;

    /// Get the dialect name (e.g., "mysql", "sqlserver").
    fn name(&self) -> &str {
        self.id().name()
    }

    /// Quote an identifier (table or column name).
    fn quote_ident(&self, name: &str) -> String;

    /// Named parameter placeholder for the 1-based `index`.
    fn param_placeholder(&self, index: usize) -> String;

    /// Whether a backslash escapes the next character inside string literals.
    fn backslash_escapes(&self) -> bool {
        false
    }

    /// Replace `[name]` markers in a raw fragment with quoted identifiers.
    fn wrap_identifiers(&self, expression: &str) -> String {
        let mut out = String::with_capacity(expression.len());
        let mut rest = expression;
        while let Some(open) = rest.find('[') {
            match rest[open..].find(']') {
                Some(close) => {
                    out.push_str(&rest[..open]);
                    out.push_str(&self.quote_ident(&rest[open + 1..open + close]));
                    rest = &rest[open + close + 1..];
                }
                None => break,
            }
        }
        out.push_str(rest);
        out
    }

    /// Build a SELECT with this engine's pagination syntax.
    fn build_select_query(&self, opts: &SelectQueryOptions) -> String;

    /// Query returning the server version, when pagination support varies by version.
    fn legacy_pagination_probe(&self) -> Option<&'static str> {
        None
    }

    /// Interpret the probe result; true when native OFFSET paging is unavailable.
    fn is_legacy_version(&self, _version: &str) -> bool {
        false
    }

    /// Native column type for a canonical column.
    fn native_type(&self, column: &TableColumn) -> String;

    /// Canonical type and VarChar length for a catalog-reported type.
    fn to_canonical(&self, native: &str, max_length: i64) -> (CanonicalColumnType, u32) {
        crate::dialect::canonical::to_canonical(native, max_length)
    }

    /// Column type for an identity column. `for_alter` is set when the
    /// column is added to an existing table.
    fn auto_increment_type(&self, for_alter: bool) -> String;

    /// Whether the identity type already declares the primary key.
    fn inline_identity_primary_key(&self) -> bool {
        false
    }

    /// Row-order expression for engines that cannot add an identity column
    /// in place and must rebuild the table instead.
    fn identity_rebuild_order(&self) -> Option<&'static str> {
        None
    }

    /// Table-level primary key clause.
    fn primary_key_clause(&self, table: &str, columns: &[&str]) -> String {
        let cols = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            self.quote_ident(&format!("PK_{}", table)),
            cols
        )
    }

    /// Suffix appended after the closing parenthesis of CREATE TABLE.
    fn table_options(&self) -> &str {
        ""
    }

    /// ALTER TABLE statement adding one column definition.
    fn add_column_sql(&self, table: &str, column_definition: &str) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_ident(table),
            column_definition
        )
    }

    /// ALTER TABLE statement dropping one column.
    fn drop_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_ident(table),
            self.quote_ident(column)
        )
    }

    /// Null-replacement function used by increment arithmetic.
    fn null_coalesce_function(&self) -> &str {
        "COALESCE"
    }

    /// `expression + n`, treating NULL as zero.
    fn column_increment(&self, expression: &str, n: i64) -> String {
        format!("{}({}, 0) + {}", self.null_coalesce_function(), expression, n)
    }

    /// `expression - n`, treating NULL as zero.
    fn column_decrement(&self, expression: &str, n: i64) -> String {
        format!("{}({}, 0) - {}", self.null_coalesce_function(), expression, n)
    }

    /// Turn an INSERT into a statement whose first result value is the new identity.
    fn insert_returning_id(&self, insert_sql: &str, id_column: &str) -> String;

    /// Query listing user tables. Returns SQL with `?` markers and its values.
    fn table_names_query(&self, database_name: &str) -> (String, Vec<SqlValue>);

    /// Query describing a table's columns as rows of
    /// `column_name, data_type, max_length, is_identity, is_primary_key`.
    fn table_columns_query(
        &self,
        database_name: &str,
        owner: &str,
        table: &str,
    ) -> (String, Vec<SqlValue>);

    /// Case convention applied to table names in catalog existence queries.
    fn existence_case(&self, table: &str) -> String {
        table.to_string()
    }

    /// ANSI catalog existence query returning a count.
    fn catalog_exists_query(&self, _owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM information_schema.tables WHERE LOWER(table_name) = ?"
                .to_string(),
            vec![SqlValue::Text(table.to_lowercase())],
        )
    }

    /// Engine-specific catalog probe returning a count.
    fn catalog_probe_query(&self, owner: &str, table: &str) -> (String, Vec<SqlValue>);
}

/// An open database connection.
///
/// Connections are acquired per operation and released when dropped, so
/// every exit path (including `?` propagation) gives the connection back.
#[async_trait]
pub trait Connection: Send {
    /// Execute a statement, returning the number of affected rows.
    async fn execute(&mut self, statement: &CompiledStatement) -> Result<u64>;

    /// Run a query and collect all rows.
    async fn query(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>>;

    /// Run a query and return the first column of the first row.
    async fn query_scalar(&mut self, statement: &CompiledStatement) -> Result<Option<SqlValue>> {
        let rows = self.query(statement).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get_index(0).cloned())
            .filter(|v| !v.is_null()))
    }
}

/// Opens connections for a dialect and connection string.
///
/// Pooling, TLS and timeouts are the factory's concern.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(
        &self,
        dialect: DialectId,
        connection_string: &str,
    ) -> Result<Box<dyn Connection>>;
}
