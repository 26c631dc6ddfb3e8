//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sqlbridge::core::{CanonicalColumnType, TableColumn};
use sqlbridge::{
    CompiledStatement, Connection, ConnectionFactory, Database, DialectId, Entity, EntityBase,
    Result, Row, SqlValue,
};

static TRACING: Once = Once::new();

/// Route library logs to the test output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sqlbridge=debug")
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// SQLite fixtures
// =============================================================================

/// A SQLite database in a temporary directory that lives as long as the guard.
#[cfg(feature = "sqlite")]
pub struct TempSqlite {
    pub db: Database,
    _dir: tempfile::TempDir,
}

#[cfg(feature = "sqlite")]
pub fn sqlite_db() -> TempSqlite {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bridge.db");
    let db = Database::new(
        DialectId::Sqlite,
        path.to_string_lossy().to_string(),
        Arc::new(sqlbridge::SqliteConnectionFactory::new()),
    );
    TempSqlite { db, _dir: dir }
}

/// Blog post entity used across the tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub base: EntityBase,
    pub title: String,
    pub hits: i64,
    pub published: bool,
}

impl Post {
    pub fn new(title: &str, hits: i64) -> Self {
        Self {
            title: title.to_string(),
            hits,
            ..Self::default()
        }
    }
}

impl Entity for Post {
    const TABLE_NAME: &'static str = "Posts";

    fn table_columns() -> Vec<TableColumn> {
        vec![
            TableColumn::identity(),
            TableColumn::new("Guid", CanonicalColumnType::VarChar),
            TableColumn::new("LastModifiedDate", CanonicalColumnType::DateTime),
            TableColumn::varchar("Title", 200),
            TableColumn::new("Hits", CanonicalColumnType::Integer),
            TableColumn::new("Published", CanonicalColumnType::Boolean),
            TableColumn::extend("Extend"),
        ]
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn value_of(&self, column: &str) -> Option<SqlValue> {
        match column.to_ascii_lowercase().as_str() {
            "title" => Some(SqlValue::from(self.title.as_str())),
            "hits" => Some(SqlValue::from(self.hits)),
            "published" => Some(SqlValue::from(self.published)),
            _ => None,
        }
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            base: EntityBase::default(),
            title: row
                .get("Title")
                .and_then(SqlValue::to_text)
                .unwrap_or_default(),
            hits: row.get("Hits").and_then(SqlValue::as_i64).unwrap_or(0),
            published: row
                .get("Published")
                .and_then(SqlValue::as_bool)
                .unwrap_or(false),
        })
    }
}

// =============================================================================
// Recording mock
// =============================================================================

type Responder = dyn Fn(&CompiledStatement) -> Vec<Row> + Send + Sync;

/// Connection factory that records every statement and answers queries
/// from a closure. `execute` always reports one affected row.
#[derive(Clone)]
pub struct RecordingFactory {
    log: Arc<Mutex<Vec<String>>>,
    responder: Arc<Responder>,
}

impl RecordingFactory {
    pub fn new(responder: impl Fn(&CompiledStatement) -> Vec<Row> + Send + Sync + 'static) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Answer every query with a single scalar.
    pub fn scalar(value: SqlValue) -> Self {
        Self::new(move |_| vec![Row::new(vec!["value".to_string()], vec![value.clone()])])
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Number of recorded statements whose SQL starts with `prefix`.
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .count()
    }
}

struct RecordingConnection {
    log: Arc<Mutex<Vec<String>>>,
    responder: Arc<Responder>,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute(&mut self, statement: &CompiledStatement) -> Result<u64> {
        self.log.lock().push(statement.sql.clone());
        Ok(1)
    }

    async fn query(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        self.log.lock().push(statement.sql.clone());
        Ok((self.responder)(statement))
    }
}

#[async_trait]
impl ConnectionFactory for RecordingFactory {
    async fn connect(
        &self,
        _dialect: DialectId,
        _connection_string: &str,
    ) -> Result<Box<dyn Connection>> {
        Ok(Box::new(RecordingConnection {
            log: Arc::clone(&self.log),
            responder: Arc::clone(&self.responder),
        }))
    }
}

pub fn mock_db(dialect: DialectId, factory: &RecordingFactory) -> Database {
    init_tracing();
    Database::new(dialect, "server=mock;database=blog;uid=app", Arc::new(factory.clone()))
}
