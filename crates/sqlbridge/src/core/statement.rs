//! Compiled statements and placeholder rewriting.

use serde::Serialize;

use super::traits::Dialect;
use super::value::SqlValue;

/// SQL text plus its named parameter bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    pub sql: String,
    pub bindings: Vec<(String, SqlValue)>,
}

impl CompiledStatement {
    /// Build a statement from SQL using `?` markers, naming each marker with
    /// the dialect's placeholder syntax.
    pub fn raw(dialect: &dyn Dialect, sql: &str, values: Vec<SqlValue>) -> Self {
        let sql = rewrite_placeholders(sql, dialect.backslash_escapes(), |i| {
            dialect.param_placeholder(i)
        });
        let bindings = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (dialect.param_placeholder(i + 1), v))
            .collect();
        Self { sql, bindings }
    }

    /// Look up a bound value by placeholder name.
    pub fn binding(&self, name: &str) -> Option<&SqlValue> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.bindings.iter().map(|(_, v)| v)
    }
}

/// Replace each `?` outside of quoted literals and identifiers with the
/// placeholder produced by `name_for(n)`, numbering from 1.
///
/// With `backslash_escapes` set (MySQL), a backslash inside a `'` or `"`
/// literal escapes the next character, so `'it\'s?'` stays one literal.
pub fn rewrite_placeholders(
    sql: &str,
    backslash_escapes: bool,
    mut name_for: impl FnMut(usize) -> String,
) -> String {
    let mut out = String::with_capacity(sql.len() + 16);
    let mut index = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in sql.chars() {
        match quote {
            Some(q) => {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if backslash_escapes && ch == '\\' && (q == '\'' || q == '"') {
                    escaped = true;
                } else if ch == if q == '[' { ']' } else { q } {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' | '`' | '[' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    index += 1;
                    out.push_str(&name_for(index));
                }
                _ => out.push(ch),
            },
        }
    }

    out
}

/// Count the `?` markers that `rewrite_placeholders` would replace.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    rewrite_placeholders(sql, false, |_| {
        count += 1;
        String::new()
    });
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_numbers_markers_in_order() {
        let sql = rewrite_placeholders("a = ? AND b = ?", false, |i| format!("@p{}", i));
        assert_eq!(sql, "a = @p1 AND b = @p2");
    }

    #[test]
    fn test_rewrite_skips_quoted_text() {
        let sql = rewrite_placeholders(
            "[is?] = ? AND \"x?\" = 'what?' AND `y?` = ?",
            false,
            |i| format!("${}", i),
        );
        assert_eq!(sql, "[is?] = $1 AND \"x?\" = 'what?' AND `y?` = $2");
    }

    #[test]
    fn test_rewrite_handles_escaped_quotes() {
        // '' inside a literal closes and reopens the quote, leaving the state unchanged
        let sql = rewrite_placeholders("a = 'it''s?' AND b = ?", false, |i| format!(":p{}", i));
        assert_eq!(sql, "a = 'it''s?' AND b = :p1");
    }

    #[test]
    fn test_rewrite_backslash_escaped_quote() {
        let sql = r"note = 'it\'s?' AND id = ?";
        assert_eq!(
            rewrite_placeholders(sql, true, |i| format!("@p{}", i)),
            r"note = 'it\'s?' AND id = @p1"
        );
        // Standard SQL keeps a trailing backslash inside the literal
        assert_eq!(
            rewrite_placeholders(r"path = 'C:\' AND id = ?", false, |i| format!("${}", i)),
            r"path = 'C:\' AND id = $1"
        );
    }

    #[test]
    fn test_raw_statement_binds_after_mysql_escape() {
        let mysql = crate::drivers::dialect_for(crate::core::traits::DialectId::MySql);
        let statement = CompiledStatement::raw(
            mysql.as_ref(),
            r#"SELECT * FROM t WHERE a = "say \"hi?\"" AND b = ?"#,
            vec![SqlValue::I64(7)],
        );
        assert!(statement.sql.ends_with("b = @p1"));
        assert_eq!(statement.binding("@p1"), Some(&SqlValue::I64(7)));
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("? ? '?' ?"), 3);
        assert_eq!(count_placeholders("SELECT 1"), 0);
    }
}
