//! SQLite: double-quoted names, numbered `?N` parameters and LIMIT paging.

use crate::core::schema::{CanonicalColumnType, TableColumn};
use crate::core::traits::{Dialect, DialectId, SelectQueryOptions};
use crate::core::value::SqlValue;

/// Requires SQLite 3.35+ for `RETURNING` and `DROP COLUMN`.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn id(&self) -> DialectId {
        DialectId::Sqlite
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn param_placeholder(&self, index: usize) -> String {
        // Numbered form so drivers bind by position
        format!("?{}", index)
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        let mut sql = opts.base_sql(self);
        let offset = opts.offset.filter(|o| *o > 0);
        match (opts.limit, offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }
        sql
    }

    fn native_type(&self, column: &TableColumn) -> String {
        match column.data_type {
            CanonicalColumnType::Integer => "INTEGER".to_string(),
            CanonicalColumnType::VarChar => format!("VARCHAR({})", column.effective_length()),
            CanonicalColumnType::Text => "TEXT".to_string(),
            CanonicalColumnType::Boolean => "BOOLEAN".to_string(),
            CanonicalColumnType::DateTime => "DATETIME".to_string(),
            CanonicalColumnType::Decimal => "DECIMAL(18, 2)".to_string(),
        }
    }

    fn auto_increment_type(&self, for_alter: bool) -> String {
        // ADD COLUMN cannot declare a primary key; identity adds go through
        // a table rebuild instead
        if for_alter {
            "INTEGER".to_string()
        } else {
            "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
        }
    }

    fn inline_identity_primary_key(&self) -> bool {
        true
    }

    fn identity_rebuild_order(&self) -> Option<&'static str> {
        Some("rowid")
    }

    fn primary_key_clause(&self, _table: &str, columns: &[&str]) -> String {
        let cols = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("PRIMARY KEY ({})", cols)
    }

    fn null_coalesce_function(&self) -> &str {
        "IFNULL"
    }

    fn insert_returning_id(&self, insert_sql: &str, id_column: &str) -> String {
        format!("{} RETURNING {}", insert_sql, self.quote_ident(id_column))
    }

    fn table_names_query(&self, _database_name: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name".to_string(),
            Vec::new(),
        )
    }

    fn table_columns_query(
        &self,
        _database_name: &str,
        _owner: &str,
        table: &str,
    ) -> (String, Vec<SqlValue>) {
        (
            "SELECT name AS column_name, type AS data_type, 0 AS max_length, \
             CASE WHEN pk = 1 AND UPPER(type) = 'INTEGER' THEN 1 ELSE 0 END AS is_identity, \
             CASE WHEN pk > 0 THEN 1 ELSE 0 END AS is_primary_key \
             FROM pragma_table_info(?) ORDER BY cid"
                .to_string(),
            vec![SqlValue::from(table)],
        )
    }

    fn catalog_probe_query(&self, _owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?".to_string(),
            vec![SqlValue::from(table)],
        )
    }
}
