//! Table existence probing.
//!
//! Engines disagree on which catalog views exist and how names are cased,
//! so existence is decided by trying probes in order until one is
//! conclusive.

use tracing::{debug, warn};

use crate::core::statement::CompiledStatement;
use crate::core::traits::Dialect;
use crate::core::value::SqlValue;
use crate::database::Database;

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Exists,
    Missing,
    /// The probe could not run on this engine; try the next one.
    Inconclusive,
}

/// One way of checking whether a table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceProbe {
    /// ANSI `information_schema` count (Oracle: ALL_OBJECTS).
    Catalog,
    /// The engine's own catalog.
    DialectCatalog,
    /// `SELECT 1 FROM table WHERE 1 = 0`; an error means the table is missing.
    RawSelect,
}

impl ExistenceProbe {
    /// Probes in the order they are tried.
    pub const ORDER: [ExistenceProbe; 3] = [
        ExistenceProbe::Catalog,
        ExistenceProbe::DialectCatalog,
        ExistenceProbe::RawSelect,
    ];

    pub fn statement(&self, dialect: &dyn Dialect, owner: &str, table: &str) -> CompiledStatement {
        match self {
            ExistenceProbe::Catalog => {
                let (sql, values) = dialect.catalog_exists_query(owner, &dialect.existence_case(table));
                CompiledStatement::raw(dialect, &sql, values)
            }
            ExistenceProbe::DialectCatalog => {
                let (sql, values) = dialect.catalog_probe_query(owner, &dialect.existence_case(table));
                CompiledStatement::raw(dialect, &sql, values)
            }
            ExistenceProbe::RawSelect => CompiledStatement::raw(
                dialect,
                &format!("SELECT 1 FROM {} WHERE 1 = 0", dialect.quote_ident(table)),
                Vec::new(),
            ),
        }
    }

    pub async fn run(&self, db: &Database, table: &str) -> ProbeOutcome {
        let statement = self.statement(db.dialect(), db.owner(), table);
        match self {
            ExistenceProbe::RawSelect => match db.query(&statement).await {
                Ok(_) => ProbeOutcome::Exists,
                Err(e) => {
                    debug!("Raw select on {} failed, treating as missing: {}", table, e);
                    ProbeOutcome::Missing
                }
            },
            _ => match db.query_scalar(&statement).await {
                Ok(count) => {
                    if count.as_ref().and_then(SqlValue::as_i64).unwrap_or(0) > 0 {
                        ProbeOutcome::Exists
                    } else {
                        ProbeOutcome::Missing
                    }
                }
                Err(e) => {
                    warn!("{:?} probe for {} failed, trying next: {}", self, table, e);
                    ProbeOutcome::Inconclusive
                }
            },
        }
    }
}

/// Run the probes in order and return the first conclusive answer.
pub async fn table_exists(db: &Database, table: &str) -> bool {
    for probe in ExistenceProbe::ORDER {
        match probe.run(db, table).await {
            ProbeOutcome::Exists => return true,
            ProbeOutcome::Missing => return false,
            ProbeOutcome::Inconclusive => continue,
        }
    }
    false
}
