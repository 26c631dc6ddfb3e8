//! Typed CRUD over one table.
//!
//! A [`Repository`] binds an [`Entity`] type to a [`Database`], a table name
//! and the table's column descriptors. Every operation compiles through the
//! database (so compiled statements are counted), opens one connection per
//! statement and goes through the optional cache:
//!
//! - reads honor ReadThrough directives and skip compilation on a hit
//! - writes honor Invalidate directives, removing the key before executing
//!
//! Rows read with an `Id` but without a well-formed `Guid` get a fresh one,
//! written back with a separate UPDATE. That write is not atomic with the
//! read, so two concurrent readers of the same row may both backfill it;
//! the last write wins and either value is valid.

pub mod entity;

pub use entity::{is_valid_guid, Entity, EntityBase, ExtendAttributes, Record};

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{self, CacheProvider, Json};
use crate::core::identifier::validate_identifier;
use crate::core::schema::{TableColumn, GUID_COLUMN, ID_COLUMN, LAST_MODIFIED_DATE_COLUMN};
use crate::core::value::{Row, SqlValue};
use crate::database::Database;
use crate::error::{BridgeError, Result};
use crate::query::Query;

/// Typed data access for one table.
pub struct Repository<T: Entity> {
    db: Database,
    table: String,
    columns: Vec<TableColumn>,
    cache: Option<Arc<dyn CacheProvider>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            table: self.table.clone(),
            columns: self.columns.clone(),
            cache: self.cache.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    /// Bind to `T`'s own table and columns.
    pub fn new(db: Database) -> Self {
        Self::with_table(db, T::TABLE_NAME, T::table_columns())
    }

    pub fn with_cache(db: Database, cache: Arc<dyn CacheProvider>) -> Self {
        Self::with_table_and_cache(db, T::TABLE_NAME, T::table_columns(), cache)
    }

    /// Bind to an explicit table and column set.
    pub fn with_table(db: Database, table: impl Into<String>, columns: Vec<TableColumn>) -> Self {
        Self {
            db,
            table: table.into(),
            columns,
            cache: None,
            _entity: PhantomData,
        }
    }

    pub fn with_table_and_cache(
        db: Database,
        table: impl Into<String>,
        columns: Vec<TableColumn>,
        cache: Arc<dyn CacheProvider>,
    ) -> Self {
        Self {
            cache: Some(cache),
            ..Self::with_table(db, table, columns)
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    fn cache(&self) -> Option<&dyn CacheProvider> {
        self.cache.as_deref()
    }

    /// Target the query at this repository's table.
    fn scoped(&self, query: Query) -> Query {
        query.with_table(self.table.clone())
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.is_named(name))
    }

    fn extend_column(&self) -> Option<&str> {
        crate::core::schema::extend_column(&self.columns)
            .map(|c| c.attribute_name.as_str())
            .filter(|name| !name.is_empty())
    }

    // ----- reads -----

    /// Fetch by identity. Ids `<= 0` are not found without touching the database.
    pub async fn get(&self, id: i64) -> Result<Option<T>> {
        if id <= 0 {
            return Ok(None);
        }
        self.get_by(Query::eq(ID_COLUMN, id)).await
    }

    /// Fetch by Guid. Malformed Guids are not found without touching the database.
    pub async fn get_by_guid(&self, guid: &str) -> Result<Option<T>> {
        if !is_valid_guid(guid) {
            return Ok(None);
        }
        self.get_by(Query::eq(GUID_COLUMN, guid)).await
    }

    /// First row matching `query`.
    pub async fn get_by(&self, query: Query) -> Result<Option<T>> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query).limit(1)).await?;
        let found: Json<Option<T>> = cache::read_through(self.cache(), directive.as_ref(), || async {
            let rows = self.select_rows(query).await?;
            match rows.first() {
                Some(row) => Ok(Json(Some(self.materialize(row).await?))),
                None => Ok(Json(None)),
            }
        })
        .await?;
        Ok(found.0)
    }

    /// Every row matching `query`.
    pub async fn get_all(&self, query: Query) -> Result<Vec<T>> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query)).await?;
        let all: Json<Vec<T>> = cache::read_through(self.cache(), directive.as_ref(), || async {
            let rows = self.select_rows(query).await?;
            let mut entities = Vec::with_capacity(rows.len());
            for row in &rows {
                entities.push(self.materialize(row).await?);
            }
            Ok(Json(entities))
        })
        .await?;
        Ok(all.0)
    }

    /// First selected column of the first matching row.
    pub async fn get_value(&self, query: Query) -> Result<Option<SqlValue>> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query).limit(1)).await?;
        let value: Json<Option<SqlValue>> =
            cache::read_through(self.cache(), directive.as_ref(), || async {
                let rows = self.select_rows(query).await?;
                Ok(Json(
                    rows.first()
                        .and_then(|r| r.get_index(0).cloned())
                        .filter(|v| !v.is_null()),
                ))
            })
            .await?;
        Ok(value.0)
    }

    /// First selected column of every matching row.
    pub async fn get_values(&self, query: Query) -> Result<Vec<SqlValue>> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query)).await?;
        let values: Json<Vec<SqlValue>> =
            cache::read_through(self.cache(), directive.as_ref(), || async {
                let rows = self.select_rows(query).await?;
                Ok(Json(
                    rows.iter()
                        .filter_map(|r| r.get_index(0).cloned())
                        .collect(),
                ))
            })
            .await?;
        Ok(values.0)
    }

    async fn select_rows(&self, query: Query) -> Result<Vec<Row>> {
        let info = self.db.compile_with(|c| c.compile(query.as_select())).await?;
        self.db.query(&info.statement).await
    }

    /// Build an entity from a row: own fields, base fields, extend payload,
    /// then the Guid backfill.
    async fn materialize(&self, row: &Row) -> Result<T> {
        let mut entity = T::from_row(row)?;
        let mut base = EntityBase::from_row(row);
        if let Some(name) = self.extend_column() {
            base.extend = parse_extend(name, row.get(name));
        }
        *entity.base_mut() = base;
        self.ensure_guid(&mut entity).await?;
        Ok(entity)
    }

    async fn ensure_guid(&self, entity: &mut T) -> Result<()> {
        let id = entity.base().id;
        if id <= 0 || !self.has_column(GUID_COLUMN) || entity.base().has_valid_guid() {
            return Ok(());
        }

        let guid = Uuid::new_v4().to_string();
        let now = Local::now().naive_local();
        warn!(
            "Row {} in {} has no valid Guid, assigning {}",
            id, self.table, guid
        );

        let query = self.scoped(
            Query::eq(ID_COLUMN, id)
                .set(GUID_COLUMN, guid.as_str())
                .set(LAST_MODIFIED_DATE_COLUMN, now),
        );
        let info = self.db.compile_with(|c| c.compile(query)).await?;
        self.db.execute(&info.statement).await?;

        let base = entity.base_mut();
        base.guid = guid;
        base.last_modified_date = Some(now);
        Ok(())
    }

    // ----- aggregates -----

    pub async fn exists(&self, query: Query) -> Result<bool> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query)).await?;
        cache::read_through(self.cache(), directive.as_ref(), || async {
            let info = self.db.compile_with(|c| c.compile_exists(query)).await?;
            let count = self.db.query_scalar(&info.statement).await?;
            Ok(count.and_then(|v| v.as_i64()).unwrap_or(0) > 0)
        })
        .await
    }

    pub async fn exists_id(&self, id: i64) -> Result<bool> {
        if id <= 0 {
            return Ok(false);
        }
        self.exists(Query::eq(ID_COLUMN, id)).await
    }

    pub async fn exists_guid(&self, guid: &str) -> Result<bool> {
        if !is_valid_guid(guid) {
            return Ok(false);
        }
        self.exists(Query::eq(GUID_COLUMN, guid)).await
    }

    pub async fn count(&self, query: Query) -> Result<u64> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query)).await?;
        cache::read_through(self.cache(), directive.as_ref(), || async {
            let info = self.db.compile_with(|c| c.compile_count(query)).await?;
            let count = self.db.query_scalar(&info.statement).await?;
            Ok(count.and_then(|v| v.as_i64()).unwrap_or(0).max(0) as u64)
        })
        .await
    }

    /// Sum of the query's single selected column; zero when no rows match.
    pub async fn sum(&self, query: Query) -> Result<i64> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query)).await?;
        cache::read_through(self.cache(), directive.as_ref(), || async {
            let info = self.db.compile_with(|c| c.compile_sum(query)).await?;
            let sum = self.db.query_scalar(&info.statement).await?;
            Ok(sum.and_then(|v| v.as_i64()).unwrap_or(0))
        })
        .await
    }

    /// Maximum of the query's single selected column; `None` when no rows match.
    pub async fn max(&self, query: Query) -> Result<Option<i64>> {
        let (query, directive) = cache::prepare(self.cache(), self.scoped(query)).await?;
        cache::read_through(self.cache(), directive.as_ref(), || async {
            let info = self.db.compile_with(|c| c.compile_max(query)).await?;
            let max = self.db.query_scalar(&info.statement).await?;
            Ok(max.and_then(|v| v.as_i64()))
        })
        .await
    }

    // ----- writes -----

    /// Insert `entity`, returning the engine-assigned Id.
    ///
    /// A fresh Guid and the current time are assigned first; the new Id is
    /// written back onto the entity.
    pub async fn insert(&self, entity: &mut T) -> Result<i64> {
        {
            let base = entity.base_mut();
            base.guid = Uuid::new_v4().to_string();
            base.last_modified_date = Some(Local::now().naive_local());
        }

        let values = self.row_values(entity, false)?;
        let query = self.scoped(Query::new().as_insert(values));
        let info = self
            .db
            .compile_with(|c| c.compile_insert_returning_id(query))
            .await?;

        debug!("Executing: {}", info.statement.sql);
        let mut conn = self.db.connect().await?;
        let id = conn
            .query_scalar(&info.statement)
            .await?
            .and_then(|v| v.as_i64())
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                BridgeError::driver("insert returned no identity", format!("inserting into {}", self.table))
            })?;

        entity.base_mut().id = id;
        Ok(id)
    }

    /// Insert each entity in turn. Earlier inserts stay if a later one fails.
    pub async fn bulk_insert(&self, entities: &mut [T]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(entities.len());
        for entity in entities.iter_mut() {
            ids.push(self.insert(entity).await?);
        }
        Ok(ids)
    }

    /// Write every mapped column of `entity`, filtered on its Id.
    pub async fn update(&self, entity: &mut T) -> Result<u64> {
        let id = entity.base().id;
        if id <= 0 {
            return Err(BridgeError::Config(format!(
                "cannot update a {} row without an Id",
                self.table
            )));
        }
        {
            let base = entity.base_mut();
            if !base.has_valid_guid() {
                base.guid = Uuid::new_v4().to_string();
            }
            base.last_modified_date = Some(Local::now().naive_local());
        }

        let query = self
            .row_values(entity, true)?
            .into_iter()
            .fold(Query::eq(ID_COLUMN, id), |q, (column, value)| q.set(column, value));
        self.update_all(query).await
    }

    /// Run the query's assignments as an UPDATE, returning affected rows.
    pub async fn update_all(&self, query: Query) -> Result<u64> {
        let (query, _) = cache::prepare(self.cache(), self.scoped(query)).await?;
        let info = self.db.compile_with(|c| c.compile(query.as_update())).await?;
        self.db.execute(&info.statement).await
    }

    /// `column = column + n` on every matching row; NULL counts as zero.
    pub async fn increment_all(&self, query: Query, column: &str, n: i64) -> Result<u64> {
        validate_identifier(column)?;
        let target = format!("[{}]", column);
        let expression = self.db.dialect().column_increment(&target, n);
        self.update_all(query.clear_sets().set_raw(format!("{} = {}", target, expression), Vec::new()))
            .await
    }

    /// `column = column - n` on every matching row; NULL counts as zero.
    pub async fn decrement_all(&self, query: Query, column: &str, n: i64) -> Result<u64> {
        validate_identifier(column)?;
        let target = format!("[{}]", column);
        let expression = self.db.dialect().column_decrement(&target, n);
        self.update_all(query.clear_sets().set_raw(format!("{} = {}", target, expression), Vec::new()))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<u64> {
        if id <= 0 {
            return Ok(0);
        }
        self.delete_all(Query::eq(ID_COLUMN, id)).await
    }

    pub async fn delete_all(&self, query: Query) -> Result<u64> {
        let (query, _) = cache::prepare(self.cache(), self.scoped(query)).await?;
        let info = self.db.compile_with(|c| c.compile(query.as_delete())).await?;
        self.db.execute(&info.statement).await
    }

    /// Column values for INSERT (`for_update == false`) or UPDATE.
    ///
    /// The identity column is skipped, base columns come from the
    /// `EntityBase` and the extend column carries the attributes as JSON.
    fn row_values(&self, entity: &T, for_update: bool) -> Result<Vec<(String, SqlValue)>> {
        let base = entity.base();
        let mut values = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let name = column.attribute_name.as_str();
            if column.is_identity || column.is_named(ID_COLUMN) {
                continue;
            }
            let value = if column.is_named(GUID_COLUMN) {
                SqlValue::from(base.guid.as_str())
            } else if column.is_named(LAST_MODIFIED_DATE_COLUMN) {
                SqlValue::from(base.last_modified_date)
            } else if column.is_extend {
                SqlValue::Text(serde_json::to_string(&base.extend)?)
            } else {
                match entity.value_of(name) {
                    Some(v) => v,
                    None if for_update => continue,
                    None => SqlValue::Null,
                }
            };
            values.push((name.to_string(), value));
        }

        Ok(values)
    }
}

/// Decode the extend payload; empty or invalid text yields no attributes.
fn parse_extend(column: &str, value: Option<&SqlValue>) -> ExtendAttributes {
    let text = match value.and_then(SqlValue::to_text) {
        Some(t) if !t.trim().is_empty() => t,
        _ => return ExtendAttributes::new(),
    };
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!("Ignoring malformed {} payload", column);
            ExtendAttributes::new()
        }
    }
}
