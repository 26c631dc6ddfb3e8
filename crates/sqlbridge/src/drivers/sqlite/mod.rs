//! SQLite dialect and sqlx-backed connection factory.
//!
//! The connection factory is only available when the `sqlite` feature is
//! enabled (the default):
//!
//! ```toml
//! [dependencies]
//! sqlbridge = { version = "0.3", features = ["sqlite"] }
//! ```

#[cfg(feature = "sqlite")]
mod connection;
mod dialect;

#[cfg(feature = "sqlite")]
pub use connection::{SqliteConnectionFactory, SqliteDbConnection};
pub use dialect::SqliteDialect;
