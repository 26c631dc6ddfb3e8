//! # sqlbridge
//!
//! Dialect-aware data access for MySQL, SQL Server, PostgreSQL, Oracle and
//! SQLite.
//!
//! Describe a statement once as a [`Query`] and run it on any supported
//! engine:
//!
//! - **Compiler** renders quoting, placeholders and pagination per dialect,
//!   with a deduplicating UPDATE builder that always stamps `LastModifiedDate`
//! - **Schema** creates, alters and introspects tables through canonical
//!   column types
//! - **Repository** gives typed CRUD with engine-assigned ids, lazily
//!   backfilled Guids and a JSON extend column for dynamic attributes
//! - **Cache** layers read-through and invalidate directives over queries
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sqlbridge::{Database, DialectId, Query, Record, Repository, SqliteConnectionFactory};
//! use sqlbridge::core::{CanonicalColumnType, TableColumn};
//!
//! #[tokio::main]
//! async fn main() -> sqlbridge::Result<()> {
//!     let db = Database::new(DialectId::Sqlite, "app.db", Arc::new(SqliteConnectionFactory::new()));
//!     let columns = vec![
//!         TableColumn::identity(),
//!         TableColumn::new("Guid", CanonicalColumnType::VarChar),
//!         TableColumn::new("LastModifiedDate", CanonicalColumnType::DateTime),
//!         TableColumn::new("Title", CanonicalColumnType::VarChar),
//!     ];
//!     sqlbridge::schema::create_table(&db, "Posts", &columns).await?;
//!
//!     let posts: Repository<Record> = Repository::with_table(db, "Posts", columns);
//!     let mut post = Record::new().with("Title", "Hello");
//!     let id = posts.insert(&mut post).await?;
//!     let titles = posts.get_values(Query::new().select(["Title"]).order_by("Id")).await?;
//!     println!("inserted {} -> {:?}", id, titles);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod core;
pub mod database;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod query;
pub mod repository;
pub mod schema;

// Re-exports for convenient access
pub use cache::{CacheEntryOptions, CacheProvider, CachingDirective, MemoryCache};
pub use compiler::{CompileInfo, Compiler};
pub use config::Settings;
pub use crate::core::{CompiledStatement, Connection, ConnectionFactory, Dialect, DialectId, Row, SqlValue};
pub use database::Database;
pub use error::{BridgeError, Result};
pub use query::{Condition, Operator, Query};
pub use repository::{Entity, EntityBase, Record, Repository};

#[cfg(feature = "sqlite")]
pub use drivers::SqliteConnectionFactory;
