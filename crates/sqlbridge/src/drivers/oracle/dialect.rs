//! Oracle.
//!
//! Targets Oracle 12c+ (native identity columns and OFFSET/FETCH).

use crate::core::schema::{CanonicalColumnType, TableColumn};
use crate::core::traits::{Dialect, DialectId, SelectQueryOptions};
use crate::core::value::SqlValue;

/// Longest NVARCHAR2 in standard string mode; longer columns use NCLOB.
const MAX_NVARCHAR2_LENGTH: u32 = 2000;

#[derive(Debug, Clone, Default)]
pub struct OracleDialect;

impl OracleDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for OracleDialect {
    fn id(&self) -> DialectId {
        DialectId::Oracle
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!(":p{}", index)
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        let mut sql = opts.base_sql(self);
        if let Some(offset) = opts.offset.filter(|o| *o > 0) {
            sql.push_str(&format!(" OFFSET {} ROWS", offset));
        }
        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
        }
        sql
    }

    fn native_type(&self, column: &TableColumn) -> String {
        match column.data_type {
            CanonicalColumnType::Integer => "NUMBER(10)".to_string(),
            CanonicalColumnType::VarChar => {
                let length = column.effective_length();
                if length > MAX_NVARCHAR2_LENGTH {
                    "NCLOB".to_string()
                } else {
                    format!("NVARCHAR2({})", length)
                }
            }
            CanonicalColumnType::Text => "NCLOB".to_string(),
            CanonicalColumnType::Boolean => "NUMBER(1)".to_string(),
            CanonicalColumnType::DateTime => "TIMESTAMP(6)".to_string(),
            CanonicalColumnType::Decimal => "NUMBER(38, 2)".to_string(),
        }
    }

    fn auto_increment_type(&self, _for_alter: bool) -> String {
        "NUMBER GENERATED BY DEFAULT ON NULL AS IDENTITY".to_string()
    }

    fn add_column_sql(&self, table: &str, column_definition: &str) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            self.quote_ident(table),
            column_definition
        )
    }

    fn insert_returning_id(&self, insert_sql: &str, id_column: &str) -> String {
        // The driver binds the trailing placeholder as an output parameter
        format!(
            "{} RETURNING {} INTO :out_id",
            insert_sql,
            self.quote_ident(id_column)
        )
    }

    fn table_names_query(&self, _database_name: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT TABLE_NAME FROM user_tables ORDER BY TABLE_NAME".to_string(),
            Vec::new(),
        )
    }

    fn table_columns_query(
        &self,
        _database_name: &str,
        owner: &str,
        table: &str,
    ) -> (String, Vec<SqlValue>) {
        // NUMBER(1) and scaled NUMBERs are folded into family names here so
        // the shared canonical mapping can treat bare NUMBER as Integer
        (
            "SELECT c.COLUMN_NAME AS column_name, \
             CASE WHEN c.DATA_TYPE = 'NUMBER' AND c.DATA_PRECISION = 1 THEN 'BOOLEAN' \
                  WHEN c.DATA_TYPE = 'NUMBER' AND NVL(c.DATA_SCALE, 0) > 0 THEN 'DECIMAL' \
                  ELSE c.DATA_TYPE END AS data_type, \
             NVL(c.CHAR_LENGTH, 0) AS max_length, \
             CASE WHEN c.IDENTITY_COLUMN = 'YES' THEN 1 ELSE 0 END AS is_identity, \
             CASE WHEN EXISTS ( \
                 SELECT 1 FROM ALL_CONSTRAINTS k \
                 JOIN ALL_CONS_COLUMNS cc ON k.OWNER = cc.OWNER AND k.CONSTRAINT_NAME = cc.CONSTRAINT_NAME \
                 WHERE k.CONSTRAINT_TYPE = 'P' AND cc.OWNER = c.OWNER \
                   AND cc.TABLE_NAME = c.TABLE_NAME AND cc.COLUMN_NAME = c.COLUMN_NAME \
             ) THEN 1 ELSE 0 END AS is_primary_key \
             FROM ALL_TAB_COLUMNS c \
             WHERE c.OWNER = ? AND c.TABLE_NAME = ? \
             ORDER BY c.COLUMN_ID"
                .to_string(),
            vec![SqlValue::from(owner.to_uppercase()), SqlValue::from(table)],
        )
    }

    fn existence_case(&self, table: &str) -> String {
        table.to_uppercase()
    }

    fn catalog_exists_query(&self, owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM ALL_OBJECTS WHERE OBJECT_TYPE = 'TABLE' AND OWNER = ? AND UPPER(OBJECT_NAME) = ?".to_string(),
            vec![
                SqlValue::from(owner.to_uppercase()),
                SqlValue::from(table.to_uppercase()),
            ],
        )
    }

    fn catalog_probe_query(&self, _owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM user_tables WHERE UPPER(TABLE_NAME) = ?".to_string(),
            vec![SqlValue::from(table.to_uppercase())],
        )
    }
}
