//! Logging helpers for table entries, which are usually multi-line.
//! Keeps each log record on a single line.

const MAX_PREVIEW: usize = 300;

/// Escape an entry for single-line logging:
/// - newline => `\n`
/// - tab => `\t`
/// - other control characters => `\xNN`
///
/// Leading indentation of each line is collapsed so nested tables stay readable.
/// Entries over the preview limit end with an ellipsis.
pub fn preview_entry(entry: &str) -> String {
    let mut out = String::with_capacity(entry.len().min(MAX_PREVIEW) + 8);
    let mut count = 0usize;
    for (i, line) in entry.lines().enumerate() {
        if i > 0 {
            out.push_str("\\n");
        }
        for ch in line.trim_start().chars() {
            if count >= MAX_PREVIEW {
                out.push('…');
                return out;
            }
            count += 1;
            match ch {
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    use std::fmt::Write;
                    let _ = write!(&mut out, "\\x{:02X}", c as u32);
                }
                c => out.push(c),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::preview_entry;

    #[test]
    fn flattens_multiline_entries() {
        let entry = "  [5] = {\n    [\"lvl\"] = \"3\",\n  },";
        assert_eq!(preview_entry(entry), "[5] = {\\n[\"lvl\"] = \"3\",\\n},");
    }

    #[test]
    fn truncates_long_entries() {
        let entry = "x".repeat(400);
        let preview = preview_entry(&entry);
        assert!(preview.ends_with('…'));
        assert_eq!(preview.chars().count(), 301);
    }
}
