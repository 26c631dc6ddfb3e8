//! PostgreSQL: double-quoted names, `$N` parameters, SERIAL identities
//! and `RETURNING` for generated ids.

use crate::core::schema::{CanonicalColumnType, TableColumn};
use crate::core::traits::{Dialect, DialectId, SelectQueryOptions};
use crate::core::value::SqlValue;

#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn id(&self) -> DialectId {
        DialectId::PostgreSql
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        let mut sql = opts.base_sql(self);
        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = opts.offset.filter(|o| *o > 0) {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    fn native_type(&self, column: &TableColumn) -> String {
        match column.data_type {
            CanonicalColumnType::Integer => "integer".to_string(),
            CanonicalColumnType::VarChar => format!("varchar({})", column.effective_length()),
            CanonicalColumnType::Text => "text".to_string(),
            CanonicalColumnType::Boolean => "boolean".to_string(),
            CanonicalColumnType::DateTime => "timestamp".to_string(),
            CanonicalColumnType::Decimal => "numeric(18, 2)".to_string(),
        }
    }

    fn auto_increment_type(&self, _for_alter: bool) -> String {
        "SERIAL".to_string()
    }

    fn insert_returning_id(&self, insert_sql: &str, id_column: &str) -> String {
        format!("{} RETURNING {}", insert_sql, self.quote_ident(id_column))
    }

    fn table_names_query(&self, database_name: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT table_name FROM information_schema.tables \
             WHERE table_catalog = ? AND table_type = 'BASE TABLE' \
             AND table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_name"
                .to_string(),
            vec![SqlValue::from(database_name)],
        )
    }

    fn table_columns_query(
        &self,
        _database_name: &str,
        _owner: &str,
        table: &str,
    ) -> (String, Vec<SqlValue>) {
        (
            "SELECT c.column_name AS column_name, c.data_type AS data_type, \
             COALESCE(c.character_maximum_length, 0) AS max_length, \
             CASE WHEN c.column_default LIKE 'nextval(%' OR c.is_identity = 'YES' THEN 1 ELSE 0 END AS is_identity, \
             CASE WHEN EXISTS ( \
                 SELECT 1 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage k \
                   ON tc.constraint_name = k.constraint_name AND tc.table_schema = k.table_schema \
                 WHERE tc.constraint_type = 'PRIMARY KEY' AND k.table_name = c.table_name \
                   AND k.column_name = c.column_name AND k.table_schema = c.table_schema \
             ) THEN 1 ELSE 0 END AS is_primary_key \
             FROM information_schema.columns c \
             WHERE c.table_schema = current_schema() AND c.table_name = ? \
             ORDER BY c.ordinal_position"
                .to_string(),
            vec![SqlValue::from(table)],
        )
    }

    fn existence_case(&self, table: &str) -> String {
        table.to_lowercase()
    }

    fn catalog_probe_query(&self, _owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM pg_catalog.pg_tables WHERE tablename = ?".to_string(),
            vec![SqlValue::from(table)],
        )
    }
}
