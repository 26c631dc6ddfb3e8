//! SQLite connection factory backed by sqlx.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Row as _, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::core::statement::CompiledStatement;
use crate::core::traits::{Connection, ConnectionFactory, DialectId};
use crate::core::value::{Row, SqlValue, DATETIME_TEXT_FORMAT};
use crate::error::{BridgeError, Result};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Opens one `sqlx::SqliteConnection` per operation.
///
/// Accepts `sqlite://path`, `sqlite::memory:`, a bare file path, or an
/// ADO-style `Data Source=path` string.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnectionFactory;

impl SqliteConnectionFactory {
    pub fn new() -> Self {
        Self
    }
}

/// Extract the database location from a connection string.
fn sqlite_location(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed.starts_with("sqlite:") || !trimmed.contains('=') {
        return trimmed.to_string();
    }
    trimmed
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| {
            let key = k.trim().to_ascii_lowercase();
            key == "data source" || key == "datasource" || key == "filename"
        })
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[async_trait]
impl ConnectionFactory for SqliteConnectionFactory {
    async fn connect(
        &self,
        dialect: DialectId,
        connection_string: &str,
    ) -> Result<Box<dyn Connection>> {
        if dialect != DialectId::Sqlite {
            return Err(BridgeError::Config(format!(
                "SQLite connection factory cannot open a {} database",
                dialect
            )));
        }

        let location = sqlite_location(connection_string);
        let conn = SqliteConnectOptions::from_str(&location)
            .map_err(|e| BridgeError::connection(e, "parsing SQLite connection string"))?
            .create_if_missing(true)
            .connect()
            .await
            .map_err(|e| BridgeError::connection(e, format!("opening SQLite database {}", location)))?;

        debug!("Opened SQLite connection to {}", location);
        Ok(Box::new(SqliteDbConnection { conn }))
    }
}

/// A single open SQLite connection.
pub struct SqliteDbConnection {
    conn: SqliteConnection,
}

impl SqliteDbConnection {
    fn bind<'q>(statement: &'q CompiledStatement) -> SqliteQuery<'q> {
        let mut query = sqlx::query(&statement.sql);
        for value in statement.values() {
            query = match value {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Bool(v) => query.bind(*v),
                SqlValue::I64(v) => query.bind(*v),
                SqlValue::F64(v) => query.bind(*v),
                SqlValue::Decimal(v) => query.bind(v.to_string()),
                SqlValue::Text(v) => query.bind(v.as_str()),
                SqlValue::DateTime(v) => query.bind(v.format(DATETIME_TEXT_FORMAT).to_string()),
                SqlValue::Bytes(v) => query.bind(v.as_slice()),
            };
        }
        query
    }

    fn decode_row(row: &SqliteRow) -> Result<Row> {
        let mut out = Row::default();
        for (idx, column) in row.columns().iter().enumerate() {
            let name = column.name();
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                out.push(name, SqlValue::Null);
                continue;
            }

            let value = match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => SqlValue::I64(row.try_get::<i64, _>(idx)?),
                "REAL" => SqlValue::F64(row.try_get::<f64, _>(idx)?),
                "BLOB" => SqlValue::Bytes(row.try_get::<Vec<u8>, _>(idx)?),
                _ => SqlValue::Text(row.try_get::<String, _>(idx)?),
            };
            out.push(name, value);
        }
        Ok(out)
    }
}

#[async_trait]
impl Connection for SqliteDbConnection {
    async fn execute(&mut self, statement: &CompiledStatement) -> Result<u64> {
        let result = Self::bind(statement)
            .execute(&mut self.conn)
            .await
            .map_err(|e| BridgeError::driver(e, &statement.sql))?;
        Ok(result.rows_affected())
    }

    async fn query(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        let rows: Vec<SqliteRow> = Self::bind(statement)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| BridgeError::driver(e, &statement.sql))?;

        rows.iter().map(Self::decode_row).collect()
    }
}
