//! Read-only cache of the upstream reference datasets.
//!
//! Ids covered upstream must never be duplicated in the local tables. Each category's
//! dataset is fetched once per run on first use and kept for the rest of the run.

use std::collections::HashMap;

use log::info;

use crate::entity::EntityType;
use crate::errors::Result;
use crate::fetch::DocumentSource;
use crate::store::table::text_contains_id;

#[derive(Debug, Default)]
pub struct BaselineCache {
    datasets: HashMap<EntityType, String>,
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the baseline dataset for `kind` already holds `id`.
    pub async fn contains(
        &mut self,
        source: &dyn DocumentSource,
        kind: EntityType,
        id: u32,
    ) -> Result<bool> {
        if !self.datasets.contains_key(&kind) {
            info!("Loading baseline dataset for {}", kind);
            let text = source.fetch_baseline(kind).await?;
            self.datasets.insert(kind, text);
        }
        Ok(self
            .datasets
            .get(&kind)
            .is_some_and(|text| text_contains_id(text, id)))
    }
}
