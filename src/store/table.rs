//! In-memory form of one table file and the sorted merge over it.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{ExtractError, Result};

/// How entries are delimited inside a table's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One entry per physical line.
    OneLine,
    /// Multi-line blocks, each closed by a `  },` line.
    MultiLine,
}

const BLOCK_CLOSE: &str = "\n  },";

fn key_pattern() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"^  \[(\d+)\] = ").expect("static pattern"))
}

/// Integer key of an entry. The first line after any `  -- ` comment lines must
/// start with `  [id] = `; keys of nested tables never count.
pub fn entry_key(entry: &str) -> Option<u32> {
    let line = entry.lines().find(|line| !line.starts_with("  -- "))?;
    key_pattern()
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether a whole table text holds a top-level entry keyed `id`.
pub fn text_contains_id(text: &str, id: u32) -> bool {
    text.contains(&format!("\n  [{id}] = "))
}

/// Entry text as stored in the body. Comments only survive in multi-line framing;
/// a separate comment line would split into its own entry in a one-line table.
pub fn format_entry(id: u32, body: &str, comment: Option<&str>, framing: Framing) -> String {
    match (comment, framing) {
        (Some(c), Framing::MultiLine) => {
            let c = c.replace(['\r', '\n'], " ");
            format!("  -- {c}\n  [{id}] = {body},")
        }
        _ => format!("  [{id}] = {body},"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    header: String,
    entries: Vec<String>,
    footer: String,
}

impl TableFile {
    pub fn empty(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            entries: Vec::new(),
            footer: "}\n".to_string(),
        }
    }

    /// Split file text into header line, entries and the two trailing footer lines.
    pub fn parse(text: &str, framing: Framing, path: &Path) -> Result<Self> {
        let lines: Vec<&str> = text.split('\n').collect();
        if lines.len() < 3 {
            return Err(ExtractError::MalformedTable {
                path: path.to_path_buf(),
                reason: format!("expected header and footer, found {} line(s)", lines.len()),
            });
        }
        let header = lines[0].to_string();
        let footer = lines[lines.len() - 2..].join("\n");
        let region = lines[1..lines.len() - 2].join("\n");

        let entries = match framing {
            Framing::OneLine => region
                .split('\n')
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect(),
            Framing::MultiLine => format!("{region}\n")
                .split("\n  },\n")
                .map(|s| s.trim_start_matches('\n'))
                .filter(|s| !s.trim().is_empty())
                .map(|s| format!("{s}{BLOCK_CLOSE}"))
                .collect(),
        };

        Ok(Self {
            header,
            entries,
            footer,
        })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
    }

    /// Stable-sort entries by key, then keep the last entry of each key.
    ///
    /// Any entry without a parseable key fails the whole normalisation; nothing is
    /// dropped or reordered by fallback.
    pub fn normalize(&mut self, path: &Path) -> Result<()> {
        let mut keyed = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            let Some(key) = entry_key(&entry) else {
                return Err(ExtractError::MalformedEntry {
                    path: path.to_path_buf(),
                    entry,
                });
            };
            keyed.push((key, entry));
        }
        keyed.sort_by_key(|(key, _)| *key);

        let mut deduped: Vec<(u32, String)> = Vec::with_capacity(keyed.len());
        for (key, entry) in keyed {
            match deduped.last_mut() {
                Some(last) if last.0 == key => last.1 = entry,
                _ => deduped.push((key, entry)),
            }
        }
        self.entries = deduped.into_iter().map(|(_, e)| e).collect();
        Ok(())
    }

    pub fn keys(&self) -> Vec<u32> {
        self.entries.iter().filter_map(|e| entry_key(e)).collect()
    }

    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return format!("{}\n{}", self.header, self.footer);
        }
        format!(
            "{}\n{}\n{}",
            self.header,
            self.entries.join("\n"),
            self.footer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = "pfDB[\"units\"][\"data-turtle\"] = {\n  -- Bob\n  [7] = {\n    [\"lvl\"] = \"5\",\n  },\n  [3] = {\n    [\"lvl\"] = \"1-2\",\n  },\n}\n";

    fn path() -> &'static Path {
        Path::new("units-turtle.lua")
    }

    #[test]
    fn splits_multiline_blocks() {
        let table = TableFile::parse(UNITS, Framing::MultiLine, path()).unwrap();
        assert_eq!(table.entries().len(), 2);
        assert!(table.entries()[0].starts_with("  -- Bob\n  [7] = {"));
        assert!(table.entries()[1].ends_with("\n  },"));
    }

    #[test]
    fn nested_closers_do_not_split_blocks() {
        let text = "H\n  [1] = {\n    [\"U\"] = {\n      [4] = 100.00,\n    },\n  },\n}\n";
        let table = TableFile::parse(text, Framing::MultiLine, path()).unwrap();
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn render_round_trips_untouched_file() {
        let table = TableFile::parse(UNITS, Framing::MultiLine, path()).unwrap();
        assert_eq!(table.render(), UNITS);
    }

    #[test]
    fn sorts_and_keeps_last_duplicate() {
        let text = "H\n  [9] = \"nine\",\n  [2] = \"two\",\n}\n";
        let mut table = TableFile::parse(text, Framing::OneLine, path()).unwrap();
        table.push(format_entry(2, "\"TWO\"", None, Framing::OneLine));
        table.normalize(path()).unwrap();
        assert_eq!(
            table.render(),
            "H\n  [2] = \"TWO\",\n  [9] = \"nine\",\n}\n"
        );
    }

    #[test]
    fn unparseable_entry_is_fatal() {
        let text = "H\n  [2] = \"two\",\n  garbage\n}\n";
        let mut table = TableFile::parse(text, Framing::OneLine, path()).unwrap();
        let err = table.normalize(path()).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ExtractError::MalformedEntry { entry, .. } if entry == "  garbage"));
    }

    #[test]
    fn nested_keys_never_stand_in_for_a_broken_key() {
        let broken = "  [12a] = {\n    [\"coords\"] = {\n      [1] = { 1, 2, 3, 0 },\n    },\n  },";
        assert_eq!(entry_key(broken), None);
        assert_eq!(entry_key("  -- Bob\n  [7] = {\n    [1] = 2,\n  },"), Some(7));
        assert_eq!(entry_key("  -- Bob\n    [7] = 1,"), None);

        let text = format!("H\n{broken}\n  [5] = {{\n  }},\n}}\n");
        let mut table = TableFile::parse(&text, Framing::MultiLine, path()).unwrap();
        let err = table.normalize(path()).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedEntry { entry, .. } if entry.starts_with("  [12a]")));
    }

    #[test]
    fn too_short_file_is_malformed() {
        let err = TableFile::parse("only", Framing::OneLine, path()).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedTable { .. }));
    }

    #[test]
    fn empty_body_renders_without_blank_line() {
        let table = TableFile::parse("H\n}\n", Framing::OneLine, path()).unwrap();
        assert!(table.entries().is_empty());
        assert_eq!(table.render(), "H\n}\n");
    }

    #[test]
    fn comment_dropped_for_one_line_tables() {
        assert_eq!(
            format_entry(4, "\"x\"", Some("X"), Framing::OneLine),
            "  [4] = \"x\","
        );
        assert_eq!(
            format_entry(4, "{\n  }", Some("X"), Framing::MultiLine),
            "  -- X\n  [4] = {\n  },"
        );
    }

    #[test]
    fn contains_matches_top_level_keys_only() {
        assert!(text_contains_id(UNITS, 3));
        assert!(!text_contains_id(UNITS, 30));
        assert!(!text_contains_id("H\n    [3] = 1,\n}\n", 3));
    }
}
