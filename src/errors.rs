use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityRef;

/// Errors that can arise while crawling entities and merging them into table files.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The detail page yielded no display name.
    #[error("entry {0} not found")]
    NotFound(EntityRef),

    /// A field the extractor cannot do without is absent from the page.
    #[error("{entity} is missing required field '{field}'")]
    MissingField {
        entity: EntityRef,
        field: &'static str,
    },

    /// An existing table entry whose key cannot be parsed.
    #[error("failed to get id from entry in {}: {entry}", path.display())]
    MalformedEntry { path: PathBuf, entry: String },

    /// A table file without the header and footer framing.
    #[error("malformed table file {}: {reason}", path.display())]
    MalformedTable { path: PathBuf, reason: String },

    #[error("unknown entity type \"{0}\"")]
    UnknownEntityType(String),

    /// Wrapper around IO errors (table reads and writes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around HTTP transport errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
}

impl ExtractError {
    /// Fatal errors abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::MalformedEntry { .. } | ExtractError::MalformedTable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
