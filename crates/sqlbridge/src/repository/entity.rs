//! Entity descriptors.
//!
//! Every stored row carries the base fields in [`EntityBase`]. Entity types
//! register their columns statically through [`Entity::table_columns`] and
//! expose their own fields by column name; the repository owns the base
//! columns and the extend payload.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::schema::{TableColumn, GUID_COLUMN, ID_COLUMN, LAST_MODIFIED_DATE_COLUMN};
use crate::core::value::{Row, SqlValue};
use crate::error::Result;

/// Dynamic attributes stored in the extend column.
pub type ExtendAttributes = serde_json::Map<String, serde_json::Value>;

/// Fields shared by every entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityBase {
    /// Engine-assigned identity; zero until inserted.
    pub id: i64,
    pub guid: String,
    pub last_modified_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub extend: ExtendAttributes,
}

impl EntityBase {
    /// Read the base columns present in `row`; the extend payload is left empty.
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(ID_COLUMN).and_then(SqlValue::as_i64).unwrap_or(0),
            guid: row
                .get(GUID_COLUMN)
                .and_then(SqlValue::to_text)
                .unwrap_or_default(),
            last_modified_date: row
                .get(LAST_MODIFIED_DATE_COLUMN)
                .and_then(SqlValue::as_datetime),
            extend: ExtendAttributes::new(),
        }
    }

    pub fn has_valid_guid(&self) -> bool {
        is_valid_guid(&self.guid)
    }
}

/// Whether `guid` is a hyphenated 36-character UUID.
pub fn is_valid_guid(guid: &str) -> bool {
    guid.len() == 36 && Uuid::parse_str(guid).is_ok()
}

/// A mapped table row type.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Default table name.
    const TABLE_NAME: &'static str;

    /// Column descriptors, including the base columns.
    fn table_columns() -> Vec<TableColumn>;

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Value of a non-base column; `None` stores NULL.
    fn value_of(&self, column: &str) -> Option<SqlValue>;

    /// Build the entity's own fields from a row. Base fields are filled in
    /// by the repository afterwards.
    fn from_row(row: &Row) -> Result<Self>;
}

/// Schema-less entity for generic table access.
///
/// Every non-base column is kept by name. Used with
/// `Repository::with_table` to copy rows of tables the caller only knows
/// from the live catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub base: EntityBase,
    pub values: BTreeMap<String, SqlValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }
}

fn is_base_column(name: &str) -> bool {
    [ID_COLUMN, GUID_COLUMN, LAST_MODIFIED_DATE_COLUMN]
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

impl Entity for Record {
    const TABLE_NAME: &'static str = "";

    fn table_columns() -> Vec<TableColumn> {
        Vec::new()
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn value_of(&self, column: &str) -> Option<SqlValue> {
        self.get(column).cloned()
    }

    fn from_row(row: &Row) -> Result<Self> {
        let values = row
            .iter()
            .filter(|(name, _)| !is_base_column(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Ok(Self {
            base: EntityBase::default(),
            values,
        })
    }
}
