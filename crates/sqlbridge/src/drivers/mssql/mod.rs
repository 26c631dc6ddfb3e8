//! Microsoft SQL Server dialect.
//!
//! SQL Server 2012 (major version 11) and later page with OFFSET/FETCH;
//! older servers are detected at runtime and paged with ROW_NUMBER.

mod dialect;

pub use dialect::MssqlDialect;
