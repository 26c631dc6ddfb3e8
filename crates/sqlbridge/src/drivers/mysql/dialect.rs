//! MySQL and MariaDB.
//!
//! Provides MySQL-specific SQL syntax for identifier quoting, pagination,
//! type names, identity columns and catalog queries.

use crate::core::schema::{CanonicalColumnType, TableColumn};
use crate::core::traits::{Dialect, DialectId, SelectQueryOptions};
use crate::core::value::SqlValue;

/// Largest VARCHAR that fits a utf8mb4 row; longer columns become LONGTEXT.
const MAX_VARCHAR_LENGTH: u32 = 16_383;

/// Row limit MySQL requires when only an offset is given.
const MAX_ROWS: &str = "18446744073709551615";

/// MySQL/MariaDB dialect implementation.
///
/// Compatible with MySQL 5.7+, 8.0+, and MariaDB 10.2+.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn id(&self) -> DialectId {
        DialectId::MySql
    }

    fn quote_ident(&self, name: &str) -> String {
        // Handle names that contain backticks by doubling them
        format!("`{}`", name.replace('`', "``"))
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        let mut sql = opts.base_sql(self);

        match (opts.limit, opts.offset) {
            (Some(limit), Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
            }
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", MAX_ROWS, offset));
            }
            _ => {}
        }

        sql
    }

    fn native_type(&self, column: &TableColumn) -> String {
        match column.data_type {
            CanonicalColumnType::Integer => "INT".to_string(),
            CanonicalColumnType::VarChar => {
                let length = column.effective_length();
                if length > MAX_VARCHAR_LENGTH {
                    "LONGTEXT".to_string()
                } else {
                    format!("VARCHAR({})", length)
                }
            }
            CanonicalColumnType::Text => "LONGTEXT".to_string(),
            CanonicalColumnType::Boolean => "TINYINT(1)".to_string(),
            CanonicalColumnType::DateTime => "DATETIME".to_string(),
            CanonicalColumnType::Decimal => "DECIMAL(18, 2)".to_string(),
        }
    }

    fn backslash_escapes(&self) -> bool {
        true
    }

    fn to_canonical(&self, native: &str, max_length: i64) -> (CanonicalColumnType, u32) {
        // BOOLEAN columns are stored as TINYINT(1); any other width is a number
        let compact: String = native
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact == "tinyint(1)" {
            return (CanonicalColumnType::Boolean, 0);
        }
        crate::dialect::to_canonical(native, max_length)
    }

    fn auto_increment_type(&self, for_alter: bool) -> String {
        // An AUTO_INCREMENT column added later must still be a key
        if for_alter {
            "INT AUTO_INCREMENT UNIQUE KEY".to_string()
        } else {
            "INT AUTO_INCREMENT".to_string()
        }
    }

    fn primary_key_clause(&self, _table: &str, columns: &[&str]) -> String {
        let cols = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("PRIMARY KEY ({})", cols)
    }

    fn table_options(&self) -> &str {
        " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    }

    fn null_coalesce_function(&self) -> &str {
        "IFNULL"
    }

    fn insert_returning_id(&self, insert_sql: &str, _id_column: &str) -> String {
        format!("{}; SELECT LAST_INSERT_ID()", insert_sql)
    }

    fn table_names_query(&self, database_name: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT table_name FROM information_schema.tables WHERE table_schema = ? AND table_type = 'BASE TABLE' ORDER BY table_name".to_string(),
            vec![SqlValue::from(database_name)],
        )
    }

    fn table_columns_query(
        &self,
        database_name: &str,
        _owner: &str,
        table: &str,
    ) -> (String, Vec<SqlValue>) {
        (
            "SELECT COLUMN_NAME AS column_name, COLUMN_TYPE AS data_type, \
             COALESCE(CHARACTER_MAXIMUM_LENGTH, 0) AS max_length, \
             CASE WHEN EXTRA LIKE '%auto_increment%' THEN 1 ELSE 0 END AS is_identity, \
             CASE WHEN COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS is_primary_key \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION"
                .to_string(),
            vec![SqlValue::from(database_name), SqlValue::from(table)],
        )
    }

    fn existence_case(&self, table: &str) -> String {
        table.to_lowercase()
    }

    fn catalog_probe_query(&self, _owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM information_schema.TABLES WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?".to_string(),
            vec![SqlValue::from(table)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(limit: Option<u64>, offset: Option<u64>) -> SelectQueryOptions {
        SelectQueryOptions {
            table: "Posts".to_string(),
            columns: "*".to_string(),
            where_clause: Some("`Id` > ?".to_string()),
            order_by: Some("`Id` ASC".to_string()),
            offset,
            limit,
            legacy_pagination: false,
        }
    }

    #[test]
    fn test_quote_ident() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.quote_ident("name"), "`name`");
        assert_eq!(dialect.quote_ident("table`name"), "`table``name`");
    }

    #[test]
    fn test_param_placeholder() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.param_placeholder(1), "@p1");
        assert_eq!(dialect.param_placeholder(10), "@p10");
    }

    #[test]
    fn test_build_select_query_limit_offset() {
        let dialect = MysqlDialect::new();
        let sql = dialect.build_select_query(&select(Some(10), Some(20)));
        assert_eq!(
            sql,
            "SELECT * FROM `Posts` WHERE `Id` > ? ORDER BY `Id` ASC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_build_select_query_offset_only() {
        let dialect = MysqlDialect::new();
        let sql = dialect.build_select_query(&select(None, Some(5)));
        assert!(sql.ends_with("LIMIT 18446744073709551615 OFFSET 5"));
    }

    #[test]
    fn test_native_types() {
        let dialect = MysqlDialect::new();
        assert_eq!(
            dialect.native_type(&TableColumn::new("Title", CanonicalColumnType::VarChar)),
            "VARCHAR(500)"
        );
        assert_eq!(
            dialect.native_type(&TableColumn::varchar("Body", 20_000)),
            "LONGTEXT"
        );
        assert_eq!(
            dialect.native_type(&TableColumn::new("Flag", CanonicalColumnType::Boolean)),
            "TINYINT(1)"
        );
    }

    #[test]
    fn test_only_tinyint_one_is_boolean() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.to_canonical("tinyint(1)", 0), (CanonicalColumnType::Boolean, 0));
        assert_eq!(dialect.to_canonical("TINYINT( 1 )", 0).0, CanonicalColumnType::Boolean);
        assert_eq!(dialect.to_canonical("tinyint", 0), (CanonicalColumnType::Integer, 0));
        assert_eq!(dialect.to_canonical("tinyint(4)", 0), (CanonicalColumnType::Integer, 0));
        assert_eq!(
            dialect.to_canonical("tinyint(3) unsigned", 0),
            (CanonicalColumnType::Integer, 0)
        );
        assert_eq!(dialect.to_canonical("varchar(50)", 50).0, CanonicalColumnType::VarChar);
    }

    #[test]
    fn test_increment_uses_ifnull() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.column_increment("`Hits`", 2), "IFNULL(`Hits`, 0) + 2");
        assert_eq!(dialect.column_decrement("`Hits`", 1), "IFNULL(`Hits`, 0) - 1");
    }

    #[test]
    fn test_wrap_identifiers() {
        let dialect = MysqlDialect::new();
        assert_eq!(
            dialect.wrap_identifiers("[Hits] = [Hits] + 1"),
            "`Hits` = `Hits` + 1"
        );
    }
}
