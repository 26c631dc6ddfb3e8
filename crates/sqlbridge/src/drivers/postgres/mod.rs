//! PostgreSQL dialect.

mod dialect;

pub use dialect::PostgresDialect;
