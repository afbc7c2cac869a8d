//! # Table Store
//!
//! Persists extracted records into the pfDB table files. Each entity category owns two
//! files: a locale table holding display strings and a data table holding the
//! authoritative record.
//!
//! ```text
//! db/
//! ├── enUS/
//! │   ├── items-turtle.lua     (one entry per line)
//! │   ├── quests-turtle.lua    (multi-line blocks)
//! │   └── units-turtle.lua
//! ├── items-turtle.lua         (multi-line blocks)
//! ├── quests-turtle.lua
//! └── units-turtle.lua
//! ```
//!
//! Every file has a one-line header, a two-line footer (`}` and the trailing newline)
//! and a body of `  [id] = ...,` entries between them. Merging an entry is a full
//! read-modify-write: the body is re-split, the new entry appended, everything sorted
//! by id and duplicates collapsed to the last occurrence, so the merged entry replaces
//! any older one with the same id.

pub mod table;

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info, warn};

use crate::config::StorageConfig;
use crate::entity::EntityType;
use crate::errors::{ExtractError, Result};
use crate::logutil::preview_entry;

pub use table::{entry_key, format_entry, Framing, TableFile};

/// Which of a category's two tables an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Locale,
    Data,
}

/// A table file addressed by its name relative to the db directory, without suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub framing: Framing,
}

impl TableRef {
    /// Header written when the table file does not exist yet.
    fn default_header(&self, suffix: &str) -> String {
        let (variant, table) = match self.name.rsplit_once('/') {
            Some((dir, table)) => (dir, table),
            None => ("data", self.name.as_str()),
        };
        format!("pfDB[\"{table}\"][\"{variant}-{suffix}\"] = {{")
    }
}

pub struct TableStore {
    root: PathBuf,
    locale: String,
    suffix: String,
}

impl TableStore {
    pub fn new(root: impl Into<PathBuf>, locale: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            locale: locale.into(),
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.db_dir, &config.locale, &config.suffix)
    }

    /// The table holding `kind`'s `variant` records.
    pub fn table(&self, kind: EntityType, variant: Variant) -> TableRef {
        let stem = kind.file_stem();
        match variant {
            Variant::Locale => TableRef {
                name: format!("{}/{stem}s", self.locale),
                // quest locale entries carry title, objective and description
                framing: if kind == EntityType::Quest {
                    Framing::MultiLine
                } else {
                    Framing::OneLine
                },
            },
            Variant::Data => TableRef {
                name: format!("{stem}s"),
                framing: Framing::MultiLine,
            },
        }
    }

    /// Every table this tool knows how to sort, including the two data tables
    /// that are maintained by hand rather than extracted.
    pub fn known_tables(&self) -> Vec<TableRef> {
        let mut tables: Vec<TableRef> = [
            EntityType::Item,
            EntityType::Object,
            EntityType::Npc,
            EntityType::Quest,
        ]
        .into_iter()
        .map(|kind| self.table(kind, Variant::Locale))
        .collect();
        for name in ["areatrigger", "items", "objects", "quests-itemreq", "quests", "units"] {
            tables.push(TableRef {
                name: name.to_string(),
                framing: Framing::MultiLine,
            });
        }
        tables
    }

    pub fn path(&self, table: &TableRef) -> PathBuf {
        self.root.join(format!("{}-{}.lua", table.name, self.suffix))
    }

    /// Whether the table already holds a top-level entry for `id`. A missing file holds nothing.
    pub async fn contains(&self, kind: EntityType, variant: Variant, id: u32) -> Result<bool> {
        let path = self.path(&self.table(kind, variant));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(table::text_contains_id(&text, id)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert `body` under `id`, replacing any existing entry with the same id.
    pub async fn merge(
        &self,
        kind: EntityType,
        variant: Variant,
        id: u32,
        body: &str,
        comment: Option<&str>,
    ) -> Result<()> {
        let table = self.table(kind, variant);
        let path = self.path(&table);
        let entry = format_entry(id, body, comment, table.framing);
        info!("Adding entry [{}] to {}", id, path.display());
        debug!("{}", preview_entry(&entry));

        let header = table.default_header(&self.suffix);
        Self::rewrite_locked(&path, &header, |text| {
            let mut file = TableFile::parse(text, table.framing, &path)?;
            file.push(entry);
            file.normalize(&path)?;
            Ok(file.render())
        })?;
        info!("Entry [{}] merged into {}", id, path.display());
        Ok(())
    }

    /// Re-sort one table in place. Returns the number of entries kept.
    pub async fn sort(&self, table: &TableRef) -> Result<usize> {
        let path = self.path(table);
        if !path.exists() {
            warn!("Skipping {}, file does not exist", path.display());
            return Ok(0);
        }
        let mut kept = 0;
        let header = table.default_header(&self.suffix);
        Self::rewrite_locked(&path, &header, |text| {
            let mut file = TableFile::parse(text, table.framing, &path)?;
            file.normalize(&path)?;
            kept = file.entries().len();
            Ok(file.render())
        })?;
        info!("Sorted {} ({} entries)", path.display(), kept);
        Ok(kept)
    }

    /// Create an empty table file if none exists. Returns whether one was created.
    pub async fn ensure(&self, table: &TableRef) -> Result<bool> {
        let path = self.path(table);
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let empty = TableFile::empty(table.default_header(&self.suffix));
        tokio::fs::write(&path, empty.render()).await?;
        Ok(true)
    }

    /// Create every known table that does not exist yet. Returns the created paths.
    pub async fn ensure_all(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for table in self.known_tables() {
            if self.ensure(&table).await? {
                created.push(self.path(&table));
            }
        }
        Ok(created)
    }

    /// Read-modify-write under an exclusive lock, replacing the file through a temp
    /// file and rename so readers never observe a partial table.
    fn rewrite_locked<F>(path: &Path, default_header: &str, modify: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let mut existing = String::new();
        lock_file.read_to_string(&mut existing)?;
        if existing.is_empty() {
            existing = TableFile::empty(default_header).render();
        }
        let content = modify(&existing)?;

        replace_via_temp(path, &content)?;
        drop(lock_file);
        Ok(())
    }
}

/// Write `content` to a fresh temp file next to `path` and rename it over `path`.
/// The temp file is removed again when writing or renaming fails.
fn replace_via_temp(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("table.lua");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                if let Err(e) = tmp.write_all(content.as_bytes()).and_then(|_| tmp.flush()) {
                    drop(tmp);
                    let _ = fs::remove_file(&candidate);
                    return Err(ExtractError::Io(e));
                }
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(ExtractError::Io(e)),
        }
    };

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ExtractError::Io(e));
    }
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".tmp-"))
            .collect()
    }

    #[test]
    fn replace_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("units-turtle.lua");
        fs::write(&path, "old").unwrap();
        replace_via_temp(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(leftovers(tmp.path()).is_empty());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = tmp.path().join("units-turtle.lua");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = replace_via_temp(&path, "new").unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
        assert!(leftovers(tmp.path()).is_empty());
        assert!(path.join("keep").exists());
    }
}
