//! Oracle dialect (12c and later).

mod dialect;

pub use dialect::OracleDialect;
