//! Core abstractions shared by every engine.
//!
//! - [`schema`]: canonical column metadata
//! - [`value`]: SQL values and result rows
//! - [`statement`]: compiled statements and placeholder naming
//! - [`traits`]: dialect strategy and connection seams
//! - [`identifier`]: identifier validation
//!
//! Driver modules (`drivers/mysql`, `drivers/sqlite`, ...) implement these
//! traits; the compiler, schema manager and repository only see the traits.

pub mod identifier;
pub mod schema;
pub mod statement;
pub mod traits;
pub mod value;

pub use schema::{CanonicalColumnType, TableColumn};
pub use statement::CompiledStatement;
pub use traits::{Connection, ConnectionFactory, Dialect, DialectId, SelectQueryOptions};
pub use value::{Row, SqlValue};
