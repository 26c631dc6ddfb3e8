//! Identifier validation for dynamically built SQL.
//!
//! Table and column names cannot be bound as parameters, so they are
//! validated here and then quoted by the active dialect.

use crate::error::{BridgeError, Result};

/// Longest table or column name accepted, in bytes. SQL Server and Oracle
/// allow 128; MySQL (64) and PostgreSQL (63) reject longer names themselves.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Check a table, column or index name before it is spliced into SQL.
///
/// The name is quoted by the dialect afterwards, so any printable text is
/// accepted. Empty names, names with a NUL byte and names longer than
/// [`MAX_IDENTIFIER_LENGTH`] bytes are rejected with a `Config` error.
pub fn validate_identifier(name: &str) -> Result<()> {
    let problem = if name.is_empty() {
        "is empty"
    } else if name.contains('\0') {
        "contains a null byte"
    } else if name.len() > MAX_IDENTIFIER_LENGTH {
        "exceeds the maximum length"
    } else {
        return Ok(());
    };
    Err(BridgeError::Config(format!(
        "identifier {:?} {} (limit {} bytes)",
        name, problem, MAX_IDENTIFIER_LENGTH
    )))
}

/// Validate a list of identifiers, stopping at the first invalid one.
pub fn validate_identifiers<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    names.into_iter().try_for_each(validate_identifier)
}

/// Remove one layer of identifier quoting (`[x]`, `"x"` or `` `x` ``).
pub fn unquote(name: &str) -> &str {
    let name = name.trim();
    let bytes = name.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if matches!((first, last), (b'[', b']') | (b'"', b'"') | (b'`', b'`')) {
            return &name[1..name.len() - 1];
        }
    }
    name
}
