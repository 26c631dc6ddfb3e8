//! SQL Server.
//!
//! Provides SQL Server syntax for identifier quoting, pagination (native
//! OFFSET/FETCH on 2012+, ROW_NUMBER emulation before that), type names,
//! identity columns and catalog queries.

use crate::core::schema::{CanonicalColumnType, TableColumn};
use crate::core::traits::{Dialect, DialectId, SelectQueryOptions};
use crate::core::value::SqlValue;

/// Longest NVARCHAR with an explicit length; longer columns use NVARCHAR(MAX).
const MAX_NVARCHAR_LENGTH: u32 = 4000;

/// First major version (SQL Server 2012) with OFFSET/FETCH.
const OFFSET_FETCH_MAJOR_VERSION: u32 = 11;

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    pub fn new() -> Self {
        Self
    }

    /// Emulate OFFSET/FETCH with ROW_NUMBER for pre-2012 servers.
    fn build_row_number_query(
        &self,
        opts: &SelectQueryOptions,
        order_by: &str,
        start_row: u64,
        end_row: Option<u64>,
    ) -> String {
        let mut inner = format!(
            "SELECT {}, ROW_NUMBER() OVER (ORDER BY {}) AS [row_num] FROM {}",
            opts.columns,
            order_by,
            self.quote_ident(&opts.table)
        );
        if let Some(ref w) = opts.where_clause {
            inner.push_str(" WHERE ");
            inner.push_str(w);
        }

        let range = match end_row {
            Some(end) => format!("[row_num] BETWEEN {} AND {}", start_row, end),
            None => format!("[row_num] >= {}", start_row),
        };

        format!(
            "SELECT * FROM ({}) AS [results_wrapper] WHERE {}",
            inner, range
        )
    }
}

impl Dialect for MssqlDialect {
    fn id(&self) -> DialectId {
        DialectId::SqlServer
    }

    fn quote_ident(&self, name: &str) -> String {
        // Handle names that contain closing brackets by doubling them
        format!("[{}]", name.replace(']', "]]"))
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn build_select_query(&self, opts: &SelectQueryOptions) -> String {
        let offset = opts.offset.unwrap_or(0);

        if !opts.is_paged() {
            return opts.base_sql(self);
        }

        // Without an offset, TOP works on every version
        if offset == 0 {
            if let Some(limit) = opts.limit {
                let sql = opts.base_sql(self);
                return sql.replacen("SELECT ", &format!("SELECT TOP ({}) ", limit), 1);
            }
            return opts.base_sql(self);
        }

        // OFFSET requires an ORDER BY; fall back to a constant ordering
        let order_by = opts
            .order_by
            .clone()
            .unwrap_or_else(|| "(SELECT 0)".to_string());

        if opts.legacy_pagination {
            let end = opts.limit.map(|l| offset + l);
            return self.build_row_number_query(opts, &order_by, offset + 1, end);
        }

        let base = SelectQueryOptions {
            order_by: Some(order_by),
            ..opts.clone()
        };
        let mut sql = base.base_sql(self);
        sql.push_str(&format!(" OFFSET {} ROWS", offset));
        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
        }
        sql
    }

    fn legacy_pagination_probe(&self) -> Option<&'static str> {
        Some("select left(cast(serverproperty('productversion') as varchar), 4)")
    }

    fn is_legacy_version(&self, version: &str) -> bool {
        version
            .trim()
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok())
            .map_or(false, |major| major < OFFSET_FETCH_MAJOR_VERSION)
    }

    fn native_type(&self, column: &TableColumn) -> String {
        match column.data_type {
            CanonicalColumnType::Integer => "int".to_string(),
            CanonicalColumnType::VarChar => {
                let length = column.effective_length();
                if length > MAX_NVARCHAR_LENGTH {
                    "nvarchar(max)".to_string()
                } else {
                    format!("nvarchar({})", length)
                }
            }
            CanonicalColumnType::Text => "nvarchar(max)".to_string(),
            CanonicalColumnType::Boolean => "bit".to_string(),
            CanonicalColumnType::DateTime => "datetime2".to_string(),
            CanonicalColumnType::Decimal => "decimal(18, 2)".to_string(),
        }
    }

    fn auto_increment_type(&self, _for_alter: bool) -> String {
        "int IDENTITY (1, 1)".to_string()
    }

    fn add_column_sql(&self, table: &str, column_definition: &str) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            self.quote_ident(table),
            column_definition
        )
    }

    fn null_coalesce_function(&self) -> &str {
        "ISNULL"
    }

    fn insert_returning_id(&self, insert_sql: &str, _id_column: &str) -> String {
        format!("{}; SELECT CAST(SCOPE_IDENTITY() AS int)", insert_sql)
    }

    fn table_names_query(&self, database_name: &str) -> (String, Vec<SqlValue>) {
        (
            format!(
                "SELECT name FROM {}..sysobjects WHERE type = 'U' AND category <> 2 ORDER BY name",
                self.quote_ident(database_name)
            ),
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
            "SELECT c.COLUMN_NAME AS column_name, c.DATA_TYPE AS data_type, \
             COALESCE(c.CHARACTER_MAXIMUM_LENGTH, 0) AS max_length, \
             COLUMNPROPERTY(OBJECT_ID(c.TABLE_SCHEMA + '.' + c.TABLE_NAME), c.COLUMN_NAME, 'IsIdentity') AS is_identity, \
             CASE WHEN EXISTS ( \
                 SELECT 1 FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                 JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE k ON tc.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
                 WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' AND k.TABLE_NAME = c.TABLE_NAME AND k.COLUMN_NAME = c.COLUMN_NAME \
             ) THEN 1 ELSE 0 END AS is_primary_key \
             FROM INFORMATION_SCHEMA.COLUMNS c \
             WHERE c.TABLE_NAME = ? \
             ORDER BY c.ORDINAL_POSITION"
                .to_string(),
            vec![SqlValue::from(table)],
        )
    }

    fn catalog_probe_query(&self, _owner: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT COUNT(*) FROM sysobjects WHERE type = 'U' AND name = ?".to_string(),
            vec![SqlValue::from(table)],
        )
    }
}
