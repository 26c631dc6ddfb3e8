//! Schema management: table creation, alteration and introspection.
//!
//! Statement text comes from the pure planners in [`ddl`]; the functions
//! here run them against a [`Database`] and read the live catalog back as
//! canonical [`TableColumn`]s.

pub mod ddl;
pub mod probe;

pub use ddl::{
    add_identity_column_sql, column_definition, create_index_sql, create_table_sql,
    drop_table_sql, plan_alter_table, rebuild_with_identity_sql,
};
pub use probe::{ExistenceProbe, ProbeOutcome};

use tracing::{debug, info, warn};

use crate::core::identifier::validate_identifier;
use crate::core::schema::TableColumn;
use crate::core::statement::CompiledStatement;
use crate::core::value::{Row, SqlValue};
use crate::database::Database;
use crate::error::{BridgeError, Result};

/// Names of the user tables in the target database.
pub async fn get_table_names(db: &Database) -> Result<Vec<String>> {
    let (sql, values) = db.dialect().table_names_query(db.database_name());
    let statement = CompiledStatement::raw(db.dialect(), &sql, values);
    let rows = db.query(&statement).await?;
    Ok(rows
        .iter()
        .filter_map(|row| row.get_index(0).and_then(SqlValue::to_text))
        .collect())
}

/// Live columns of `table` in canonical form, in catalog order.
///
/// An unknown table yields an empty list.
pub async fn get_table_columns(db: &Database, table: &str) -> Result<Vec<TableColumn>> {
    validate_identifier(table)?;
    let dialect = db.dialect();
    let (sql, values) = dialect.table_columns_query(db.database_name(), db.owner(), table);
    let statement = CompiledStatement::raw(dialect, &sql, values);
    let rows = db.query(&statement).await?;
    rows.iter().map(|row| column_from_row(db, row)).collect()
}

fn column_from_row(db: &Database, row: &Row) -> Result<TableColumn> {
    let text = |name: &str| row.get(name).and_then(SqlValue::to_text);
    let flag = |name: &str| row.get(name).and_then(SqlValue::as_bool).unwrap_or(false);

    let name = text("column_name")
        .ok_or_else(|| BridgeError::decode("column_name", "catalog row has no column name"))?;
    let native = text("data_type").unwrap_or_default();
    let max_length = row
        .get("max_length")
        .and_then(SqlValue::as_i64)
        .unwrap_or(0);

    let (data_type, data_length) = db.dialect().to_canonical(&native, max_length);
    Ok(TableColumn {
        data_length,
        is_identity: flag("is_identity"),
        is_primary_key: flag("is_primary_key"),
        ..TableColumn::new(name, data_type)
    })
}

/// Create `table` with the given columns.
pub async fn create_table(db: &Database, table: &str, columns: &[TableColumn]) -> Result<()> {
    let sql = create_table_sql(db.dialect(), table, columns)?;
    db.execute(&CompiledStatement::raw(db.dialect(), &sql, Vec::new()))
        .await?;
    info!("Created table {} with {} columns", table, columns.len());
    Ok(())
}

/// Bring `table` in line with `columns`, dropping the names in `drop_names`.
///
/// Statements run one at a time on a single connection. The first failure
/// is returned and the statements before it stay applied. Returns the
/// statements that ran.
pub async fn alter_table(
    db: &Database,
    table: &str,
    columns: &[TableColumn],
    drop_names: &[String],
) -> Result<Vec<String>> {
    let live = get_table_columns(db, table).await?;
    let statements = plan_alter_table(db.dialect(), table, columns, &live, drop_names)?;
    if statements.is_empty() {
        debug!("Table {} already matches", table);
        return Ok(statements);
    }

    let mut conn = db.connect().await?;
    for sql in &statements {
        debug!("Executing: {}", sql);
        conn.execute(&CompiledStatement::raw(db.dialect(), sql, Vec::new()))
            .await?;
    }
    info!("Altered table {} ({} statements)", table, statements.len());
    Ok(statements)
}

/// Make sure `table` has an identity column to order paged reads by.
///
/// When `columns` has neither an identity column nor one named `Id`, an
/// `Id` identity column is added to the table right away and put at the
/// head of `columns`. Returns the identity column's name.
///
/// Engines that cannot add an identity column in place get the table
/// rebuilt inside a transaction, numbering existing rows in insertion
/// order.
pub async fn add_identity_column_if_not_exists(
    db: &Database,
    table: &str,
    columns: &mut Vec<TableColumn>,
) -> Result<String> {
    if let Some(existing) = ddl::has_identity(columns) {
        return Ok(existing.attribute_name.clone());
    }

    match db.dialect().identity_rebuild_order() {
        Some(order) => {
            let live = get_table_columns(db, table).await?;
            if let Some(existing) = ddl::has_identity(&live) {
                let existing = existing.clone();
                let name = existing.attribute_name.clone();
                columns.insert(0, existing);
                debug!("Table {} already has identity column {}", table, name);
                return Ok(name);
            }
            let statements = rebuild_with_identity_sql(db.dialect(), table, &live, order)?;
            run_in_transaction(db, &statements).await?;
        }
        None => {
            let sql = add_identity_column_sql(db.dialect(), table)?;
            db.execute(&CompiledStatement::raw(db.dialect(), &sql, Vec::new()))
                .await?;
        }
    }

    let column = TableColumn::identity();
    let name = column.attribute_name.clone();
    columns.insert(0, column);
    info!("Added identity column {} to {}", name, table);
    Ok(name)
}

async fn run_in_transaction(db: &Database, statements: &[String]) -> Result<()> {
    let dialect = db.dialect();
    let raw = |sql: &str| CompiledStatement::raw(dialect, sql, Vec::new());
    let mut conn = db.connect().await?;

    conn.execute(&raw("BEGIN")).await?;
    for sql in statements {
        debug!("Executing: {}", sql);
        if let Err(e) = conn.execute(&raw(sql)).await {
            if let Err(rollback) = conn.execute(&raw("ROLLBACK")).await {
                warn!("Rollback failed: {}", rollback);
            }
            return Err(e);
        }
    }
    conn.execute(&raw("COMMIT")).await?;
    Ok(())
}

/// Whether `table` exists. Probe failures are never surfaced.
pub async fn is_table_exists(db: &Database, table: &str) -> bool {
    if validate_identifier(table).is_err() {
        return false;
    }
    probe::table_exists(db, table).await
}

/// Create an index; tokens are column names with an optional ASC/DESC.
pub async fn create_index(
    db: &Database,
    table: &str,
    index_name: &str,
    column_tokens: &[&str],
) -> Result<()> {
    let sql = create_index_sql(db.dialect(), table, index_name, column_tokens)?;
    db.execute(&CompiledStatement::raw(db.dialect(), &sql, Vec::new()))
        .await?;
    info!("Created index {} on {}", index_name, table);
    Ok(())
}

pub async fn drop_table(db: &Database, table: &str) -> Result<()> {
    let sql = drop_table_sql(db.dialect(), table)?;
    db.execute(&CompiledStatement::raw(db.dialect(), &sql, Vec::new()))
        .await?;
    info!("Dropped table {}", table);
    Ok(())
}
