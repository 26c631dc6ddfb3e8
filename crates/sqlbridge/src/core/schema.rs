//! Canonical column metadata.
//!
//! These types describe columns independently of any engine. The DDL
//! generator maps them to native types through the active dialect, and
//! catalog introspection maps native types back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default length for VarChar columns with no explicit length.
pub const VARCHAR_DEFAULT_LENGTH: u32 = 500;

/// Length of the Guid column.
pub const GUID_LENGTH: u32 = 50;

/// Name of the engine-assigned surrogate key column.
pub const ID_COLUMN: &str = "Id";

/// Name of the globally unique secondary identifier column.
pub const GUID_COLUMN: &str = "Guid";

/// Name of the engine-managed modification timestamp column.
pub const LAST_MODIFIED_DATE_COLUMN: &str = "LastModifiedDate";

/// Dialect-independent column type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalColumnType {
    Integer,
    /// Bounded text; the bound lives in [`TableColumn::data_length`].
    VarChar,
    Text,
    Boolean,
    DateTime,
    Decimal,
}

impl fmt::Display for CanonicalColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CanonicalColumnType::Integer => "Integer",
            CanonicalColumnType::VarChar => "VarChar",
            CanonicalColumnType::Text => "Text",
            CanonicalColumnType::Boolean => "Boolean",
            CanonicalColumnType::DateTime => "DateTime",
            CanonicalColumnType::Decimal => "Decimal",
        };
        f.write_str(name)
    }
}

/// Column descriptor used by table creation, alteration and introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Column name.
    pub attribute_name: String,

    /// Canonical type.
    pub data_type: CanonicalColumnType,

    /// Length for VarChar columns; 0 means "use the default".
    #[serde(default)]
    pub data_length: u32,

    /// Part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,

    /// Engine-assigned identity / auto-increment column.
    #[serde(default)]
    pub is_identity: bool,

    /// Stores the serialized dynamic attribute bag.
    #[serde(default)]
    pub is_extend: bool,
}

impl TableColumn {
    /// Create a plain column of the given type.
    pub fn new(name: impl Into<String>, data_type: CanonicalColumnType) -> Self {
        Self {
            attribute_name: name.into(),
            data_type,
            data_length: 0,
            is_primary_key: false,
            is_identity: false,
            is_extend: false,
        }
    }

    /// Create a VarChar column with an explicit length.
    pub fn varchar(name: impl Into<String>, length: u32) -> Self {
        Self {
            data_length: length,
            ..Self::new(name, CanonicalColumnType::VarChar)
        }
    }

    /// The identity primary key column named `Id`.
    pub fn identity() -> Self {
        Self {
            is_primary_key: true,
            is_identity: true,
            ..Self::new(ID_COLUMN, CanonicalColumnType::Integer)
        }
    }

    /// A Text column carrying the dynamic attribute payload.
    pub fn extend(name: impl Into<String>) -> Self {
        Self {
            is_extend: true,
            ..Self::new(name, CanonicalColumnType::Text)
        }
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Effective length, substituting the default for VarChar columns.
    pub fn effective_length(&self) -> u32 {
        if self.data_type == CanonicalColumnType::VarChar && self.data_length == 0 {
            VARCHAR_DEFAULT_LENGTH
        } else {
            self.data_length
        }
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.attribute_name.eq_ignore_ascii_case(name)
    }

    /// Apply the fixed shapes of the reserved base columns.
    ///
    /// `Id` becomes an Integer identity primary key, `Guid` a VarChar(50) and
    /// `LastModifiedDate` a DateTime, whatever the caller supplied.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.is_named(ID_COLUMN) {
            self.data_type = CanonicalColumnType::Integer;
            self.is_identity = true;
            self.is_primary_key = true;
        } else if self.is_named(GUID_COLUMN) {
            self.data_type = CanonicalColumnType::VarChar;
            self.data_length = GUID_LENGTH;
        } else if self.is_named(LAST_MODIFIED_DATE_COLUMN) {
            self.data_type = CanonicalColumnType::DateTime;
        }
        if self.data_type == CanonicalColumnType::VarChar && self.data_length == 0 {
            self.data_length = VARCHAR_DEFAULT_LENGTH;
        }
        self
    }
}

/// Find the column flagged as the extend payload, if any.
pub fn extend_column(columns: &[TableColumn]) -> Option<&TableColumn> {
    columns.iter().find(|c| c.is_extend)
}

/// Find the identity column, if any.
pub fn identity_column(columns: &[TableColumn]) -> Option<&TableColumn> {
    columns.iter().find(|c| c.is_identity)
}
