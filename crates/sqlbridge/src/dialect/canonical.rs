//! Native type names to canonical column types.
//!
//! Each dialect renders canonical types through `Dialect::native_type`. The
//! reverse direction is mostly shared across engines: a catalog reports a
//! type family name (`varchar`, `nvarchar2`, `timestamp with time zone`) and
//! sometimes a length, and this module folds that into the fixed canonical
//! vocabulary. Dialects override `Dialect::to_canonical` only where a family
//! name means something engine-specific (MySQL `tinyint(1)`).

use crate::core::schema::{CanonicalColumnType, VARCHAR_DEFAULT_LENGTH};

/// A native type split into its lowercase family name and optional length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub family: String,
    pub length: Option<i64>,
}

impl NativeType {
    /// Parse `VARCHAR(255)`, `decimal(18, 2)` or `timestamp(6) with time zone`.
    pub fn parse(native: &str) -> Self {
        let lower = native.trim().to_ascii_lowercase();
        match lower.find('(') {
            Some(open) => {
                let close = lower[open..].find(')').map(|c| open + c);
                let inner = close.map(|c| &lower[open + 1..c]).unwrap_or("");
                let length = inner
                    .split(',')
                    .next()
                    .and_then(|n| n.trim().parse::<i64>().ok())
                    .or_else(|| (inner.trim() == "max").then_some(-1));
                let mut family = lower[..open].trim().to_string();
                if let Some(c) = close {
                    let rest = lower[c + 1..].trim();
                    if !rest.is_empty() {
                        family.push(' ');
                        family.push_str(rest);
                    }
                }
                Self { family, length }
            }
            None => Self {
                family: lower,
                length: None,
            },
        }
    }
}

/// Map a catalog-reported type to its canonical type and VarChar length.
///
/// `max_length` is the catalog's character length column; values `<= 0`
/// mean "not reported" (or `-1` for SQL Server `max`), in which case any
/// length embedded in the type name is used.
pub fn to_canonical(native: &str, max_length: i64) -> (CanonicalColumnType, u32) {
    let parsed = NativeType::parse(native);
    let length = if max_length != 0 {
        max_length
    } else {
        parsed.length.unwrap_or(0)
    };

    let family = parsed
        .family
        .trim_end_matches(" zerofill")
        .trim_end_matches(" unsigned")
        .trim_end_matches(" signed");
    let canonical = match family {
        "int" | "integer" | "bigint" | "smallint" | "mediumint" | "tinyint" | "int2" | "int4"
        | "int8"
        | "serial" | "bigserial" | "number" | "counter" => CanonicalColumnType::Integer,
        "bit" | "bool" | "boolean" => CanonicalColumnType::Boolean,
        "decimal" | "numeric" | "money" | "smallmoney" | "float" | "real" | "double"
        | "double precision" | "float4" | "float8" | "binary_float" | "binary_double" => {
            CanonicalColumnType::Decimal
        }
        "text" | "ntext" | "tinytext" | "mediumtext" | "longtext" | "clob" | "nclob" | "long"
        | "json" | "jsonb" | "xml" => CanonicalColumnType::Text,
        f if f.starts_with("date") || f.starts_with("timestamp") || f == "smalldatetime" => {
            CanonicalColumnType::DateTime
        }
        f if f.contains("char") => {
            if length < 0 {
                CanonicalColumnType::Text
            } else {
                CanonicalColumnType::VarChar
            }
        }
        _ => CanonicalColumnType::Text,
    };

    let data_length = match canonical {
        CanonicalColumnType::VarChar if length > 0 => length as u32,
        CanonicalColumnType::VarChar => VARCHAR_DEFAULT_LENGTH,
        _ => 0,
    };

    (canonical, data_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_type() {
        assert_eq!(
            NativeType::parse("VARCHAR(255)"),
            NativeType {
                family: "varchar".to_string(),
                length: Some(255)
            }
        );
        assert_eq!(NativeType::parse("decimal(18, 2)").length, Some(18));
        assert_eq!(NativeType::parse("nvarchar(max)").length, Some(-1));
        assert_eq!(
            NativeType::parse("timestamp(6) with time zone").family,
            "timestamp with time zone"
        );
        assert_eq!(NativeType::parse("INTEGER").length, None);
    }

    #[test]
    fn test_integer_families() {
        for native in ["int", "INTEGER", "bigint", "NUMBER", "serial", "tinyint", "int(10) unsigned"] {
            assert_eq!(to_canonical(native, 0).0, CanonicalColumnType::Integer, "{}", native);
        }
    }

    #[test]
    fn test_varchar_length_from_catalog_or_name() {
        assert_eq!(to_canonical("varchar", 50), (CanonicalColumnType::VarChar, 50));
        assert_eq!(to_canonical("VARCHAR(50)", 0), (CanonicalColumnType::VarChar, 50));
        assert_eq!(to_canonical("nvarchar2", 0), (CanonicalColumnType::VarChar, 500));
        assert_eq!(to_canonical("character varying", 120).1, 120);
    }

    #[test]
    fn test_unbounded_varchar_is_text() {
        assert_eq!(to_canonical("nvarchar", -1).0, CanonicalColumnType::Text);
        assert_eq!(to_canonical("nvarchar(max)", 0).0, CanonicalColumnType::Text);
    }

    #[test]
    fn test_other_families() {
        assert_eq!(to_canonical("bit", 0).0, CanonicalColumnType::Boolean);
        assert_eq!(to_canonical("datetime2", 0).0, CanonicalColumnType::DateTime);
        assert_eq!(
            to_canonical("timestamp without time zone", 0).0,
            CanonicalColumnType::DateTime
        );
        assert_eq!(to_canonical("numeric", 0).0, CanonicalColumnType::Decimal);
        assert_eq!(to_canonical("longtext", 0).0, CanonicalColumnType::Text);
        assert_eq!(to_canonical("uniqueidentifier", 0).0, CanonicalColumnType::Text);
    }
}
