//! Database driver implementations.
//!
//! - [`mysql`]: MySQL/MariaDB dialect
//! - [`mssql`]: Microsoft SQL Server dialect
//! - [`postgres`]: PostgreSQL dialect
//! - [`oracle`]: Oracle dialect
//! - [`sqlite`]: SQLite dialect and, with the `sqlite` feature, a connection factory
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with a `Dialect` implementation
//! 2. Add a `DialectId` variant and map it in [`dialect_for`]
//! 3. Gate any driver crate behind a feature flag in `Cargo.toml`

pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnectionFactory;

use crate::core::traits::{Dialect, DialectId};

/// The dialect strategy for an engine.
///
/// Called once per `Database`; the strategy is then shared by every
/// compiler and schema operation on that database.
pub fn dialect_for(id: DialectId) -> Arc<dyn Dialect> {
    match id {
        DialectId::MySql => Arc::new(MysqlDialect::new()),
        DialectId::SqlServer => Arc::new(MssqlDialect::new()),
        DialectId::PostgreSql => Arc::new(PostgresDialect::new()),
        DialectId::Oracle => Arc::new(OracleDialect::new()),
        DialectId::Sqlite => Arc::new(SqliteDialect::new()),
    }
}

/// Create a dialect strategy from a database type string.
///
/// # Errors
///
/// Returns an error if the database type is not recognized.
pub fn dialect_from_name(db_type: &str) -> crate::error::Result<Arc<dyn Dialect>> {
    DialectId::from_name(db_type).map(dialect_for)
}
