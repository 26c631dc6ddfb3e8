//! DDL statement planning.
//!
//! Pure functions from canonical column metadata to dialect SQL, so the
//! generated DDL can be checked without a live connection.

use crate::core::identifier::{validate_identifier, validate_identifiers};
use crate::core::schema::{TableColumn, ID_COLUMN};
use crate::core::traits::Dialect;
use crate::error::{BridgeError, Result};

/// Column definition as it appears in CREATE TABLE or ALTER TABLE ADD.
pub fn column_definition(dialect: &dyn Dialect, column: &TableColumn, for_alter: bool) -> String {
    let native = if column.is_identity {
        dialect.auto_increment_type(for_alter)
    } else {
        dialect.native_type(column)
    };
    format!("{} {}", dialect.quote_ident(&column.attribute_name), native)
}

/// CREATE TABLE for the given columns.
///
/// Reserved base columns take their fixed shapes first. One primary key
/// clause is emitted: the identity column when present, otherwise every
/// column flagged as a primary key. Engines whose identity type declares
/// the key inline get no separate clause.
pub fn create_table_sql(
    dialect: &dyn Dialect,
    table: &str,
    columns: &[TableColumn],
) -> Result<String> {
    validate_identifier(table)?;
    if columns.is_empty() {
        return Err(BridgeError::Config(format!(
            "table {} needs at least one column",
            table
        )));
    }
    validate_identifiers(columns.iter().map(|c| c.attribute_name.as_str()))?;

    let columns: Vec<TableColumn> = columns.iter().cloned().map(TableColumn::normalized).collect();
    let mut defs: Vec<String> = columns
        .iter()
        .map(|c| column_definition(dialect, c, false))
        .collect();

    let identity = columns.iter().find(|c| c.is_identity);
    let key_columns: Vec<&str> = match identity {
        Some(id) => vec![id.attribute_name.as_str()],
        None => columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.attribute_name.as_str())
            .collect(),
    };
    let inline_key = identity.is_some() && dialect.inline_identity_primary_key();
    if !key_columns.is_empty() && !inline_key {
        defs.push(dialect.primary_key_clause(table, &key_columns));
    }

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n){}",
        dialect.quote_ident(table),
        defs.join(",\n    "),
        dialect.table_options()
    ))
}

/// ALTER TABLE statements turning `live` into `requested`.
///
/// Adds every requested column missing from the live schema. Drops only the
/// columns named in `drop_names` that exist; omission never implies a drop.
/// Names are compared case-insensitively.
pub fn plan_alter_table(
    dialect: &dyn Dialect,
    table: &str,
    requested: &[TableColumn],
    live: &[TableColumn],
    drop_names: &[String],
) -> Result<Vec<String>> {
    validate_identifier(table)?;
    validate_identifiers(requested.iter().map(|c| c.attribute_name.as_str()))?;
    validate_identifiers(drop_names.iter().map(String::as_str))?;

    let exists = |name: &str| live.iter().any(|c| c.is_named(name));
    let mut statements = Vec::new();

    for column in requested {
        if exists(&column.attribute_name) {
            continue;
        }
        let column = column.clone().normalized();
        statements.push(dialect.add_column_sql(table, &column_definition(dialect, &column, true)));
    }

    for name in drop_names {
        if exists(name) {
            statements.push(dialect.drop_column_sql(table, name));
        }
    }

    Ok(statements)
}

/// ALTER TABLE adding an `Id` identity column.
pub fn add_identity_column_sql(dialect: &dyn Dialect, table: &str) -> Result<String> {
    validate_identifier(table)?;
    let column = TableColumn::identity();
    Ok(dialect.add_column_sql(table, &column_definition(dialect, &column, true)))
}

/// Statements rebuilding `table` around a new `Id` identity column.
///
/// A copy named `<table>_new` is created with the identity column ahead of
/// the `live` columns, filled in `order` so existing rows are numbered in
/// insertion order, and then swapped in for the original. Indexes on the
/// original table are not carried over.
pub fn rebuild_with_identity_sql(
    dialect: &dyn Dialect,
    table: &str,
    live: &[TableColumn],
    order: &str,
) -> Result<Vec<String>> {
    validate_identifier(table)?;
    let staging = format!("{}_new", table);
    validate_identifier(&staging)?;

    let mut columns = Vec::with_capacity(live.len() + 1);
    columns.push(TableColumn::identity());
    columns.extend(live.iter().cloned().map(|mut c| {
        c.is_identity = false;
        c.is_primary_key = false;
        c
    }));

    let copied = live
        .iter()
        .map(|c| dialect.quote_ident(&c.attribute_name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut statements = vec![create_table_sql(dialect, &staging, &columns)?];
    if !live.is_empty() {
        statements.push(format!(
            "INSERT INTO {} ({}) SELECT {} FROM {} ORDER BY {}",
            dialect.quote_ident(&staging),
            copied,
            copied,
            dialect.quote_ident(table),
            order
        ));
    }
    statements.push(drop_table_sql(dialect, table)?);
    statements.push(format!(
        "ALTER TABLE {} RENAME TO {}",
        dialect.quote_ident(&staging),
        dialect.quote_ident(table)
    ));
    Ok(statements)
}

/// CREATE INDEX. Each token is a column name with an optional `ASC` or
/// `DESC` suffix; ascending is the default.
pub fn create_index_sql(
    dialect: &dyn Dialect,
    table: &str,
    index_name: &str,
    column_tokens: &[&str],
) -> Result<String> {
    validate_identifier(table)?;
    validate_identifier(index_name)?;
    if column_tokens.is_empty() {
        return Err(BridgeError::Config(format!(
            "index {} needs at least one column",
            index_name
        )));
    }

    let mut columns = Vec::with_capacity(column_tokens.len());
    for token in column_tokens {
        let (name, direction) = parse_index_token(token)?;
        validate_identifier(name)?;
        columns.push(format!("{} {}", dialect.quote_ident(name), direction));
    }

    Ok(format!(
        "CREATE INDEX {} ON {} ({})",
        dialect.quote_ident(index_name),
        dialect.quote_ident(table),
        columns.join(", ")
    ))
}

fn parse_index_token(token: &str) -> Result<(&str, &'static str)> {
    let token = token.trim();
    match token.rsplit_once(char::is_whitespace) {
        Some((name, suffix)) if suffix.eq_ignore_ascii_case("desc") => Ok((name.trim_end(), "DESC")),
        Some((name, suffix)) if suffix.eq_ignore_ascii_case("asc") => Ok((name.trim_end(), "ASC")),
        _ => Ok((token, "ASC")),
    }
}

pub fn drop_table_sql(dialect: &dyn Dialect, table: &str) -> Result<String> {
    validate_identifier(table)?;
    Ok(format!("DROP TABLE {}", dialect.quote_ident(table)))
}

/// Whether `columns` already carries an identity or an `Id` column.
pub fn has_identity(columns: &[TableColumn]) -> Option<&TableColumn> {
    columns
        .iter()
        .find(|c| c.is_identity)
        .or_else(|| columns.iter().find(|c| c.is_named(ID_COLUMN)))
}
