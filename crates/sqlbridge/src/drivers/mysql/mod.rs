//! MySQL/MariaDB dialect.
//!
//! Supported versions: MySQL 5.7+, 8.0+ and MariaDB 10.2+. Connections are
//! provided by the caller's [`ConnectionFactory`](crate::core::ConnectionFactory).

mod dialect;

pub use dialect::MysqlDialect;
