//! Rendering of table-literal text.
//!
//! Tables are rendered one pair per line, each line prefixed by the caller's indent
//! plus two spaces, with the closing brace at the caller's indent:
//!
//! ```text
//! {
//!     ["lvl"] = "12-14",
//!     ["coords"] = {
//!       [1] = { 40.2, 51.7, 1519, 0 },
//!     },
//!   }
//! ```
//!
//! The serializer knows nothing about document depth; nesting is whatever indent the
//! caller passes at each level.

use std::fmt::{self, Write};

/// A table key. Numeric keys render bare, string keys render quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Num(u64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Num(n) => write!(f, "[{n}]"),
            // JSON string escaping matches the downstream reader for keys
            Key::Str(s) => write!(
                f,
                "[{}]",
                serde_json::to_string(s).map_err(|_| fmt::Error)?
            ),
        }
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Num(n.into())
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Num(n as u64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

/// Render `pairs` as a table literal. Pairs whose value is `None` are omitted.
pub fn build_table<K, I>(indent: &str, pairs: I) -> String
where
    K: Into<Key>,
    I: IntoIterator<Item = (K, Option<String>)>,
{
    let mut out = String::from("{\n");
    for (key, value) in pairs {
        let Some(value) = value else { continue };
        let _ = writeln!(out, "{indent}  {} = {value},", key.into());
    }
    out.push_str(indent);
    out.push('}');
    out
}

/// Double-quoted string literal with backslashes, quotes and line breaks escaped.
pub fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-line list literal, `{ 1, 2, 3 }`.
pub fn inline_list<T: fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    format!("{{ {} }}", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_absent_values() {
        let table = build_table(
            "  ",
            [
                ("fac", Some(quoted("A"))),
                ("lvl", None),
                ("coords", Some("{}".to_string())),
            ],
        );
        assert_eq!(table, "{\n    [\"fac\"] = \"A\",\n    [\"coords\"] = {},\n  }");
    }

    #[test]
    fn numeric_keys_are_bare() {
        let table = build_table("    ", [(1usize, Some("100.00".to_string()))]);
        assert_eq!(table, "{\n      [1] = 100.00,\n    }");
    }

    #[test]
    fn empty_table_still_closes() {
        let table = build_table::<&str, _>("  ", []);
        assert_eq!(table, "{\n  }");
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(quoted(r#"say "hi" \o"#), r#""say \"hi\" \\o""#);
    }

    #[test]
    fn line_breaks_never_reach_the_literal() {
        assert_eq!(quoted("Old\r\nName"), r#""Old\r\nName""#);
    }

    #[test]
    fn inline_list_joins_with_commas() {
        assert_eq!(inline_list([3, 1, 2]), "{ 3, 1, 2 }");
        assert_eq!(inline_list(Vec::<u32>::new()), "{  }");
    }
}
