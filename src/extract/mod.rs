//! # Extractors
//!
//! Turn a fetched detail page into the records written to the table files. There is
//! one extractor per [`EntityType`]; [`extractor_for`] is the registry.
//!
//! Every extractor produces an [`ExtractionResult`]:
//!
//! - `locale`: the locale-table body, or `None` to store just the quoted display name
//! - `data`: the data-table body
//! - `related`: ids of other entities this page references, which the crawler
//!   visits next
//!
//! Parsing details stay inside this module; the crawler only sees the result shape.

pub mod item;
pub mod npc;
pub mod object;
pub mod page;
pub mod quest;

use indexmap::{IndexMap, IndexSet};

use crate::entity::{EntityRef, EntityType};
use crate::errors::Result;
use crate::serializer::quoted;

pub use page::Page;

/// Forward references discovered on a page, per type in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Related {
    refs: IndexMap<EntityType, IndexSet<u32>>,
}

impl Related {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EntityType, id: u32) {
        self.refs.entry(kind).or_default().insert(id);
    }

    pub fn extend(&mut self, kind: EntityType, ids: impl IntoIterator<Item = u32>) {
        let set = self.refs.entry(kind).or_default();
        set.extend(ids);
    }

    pub fn ids(&self, kind: EntityType) -> Vec<u32> {
        self.refs
            .get(&kind)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Non-empty groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (EntityType, &IndexSet<u32>)> {
        self.refs
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(kind, ids)| (*kind, ids))
    }

    /// Every reference as an [`EntityRef`], group by group.
    pub fn entities(&self) -> Vec<EntityRef> {
        self.groups()
            .flat_map(|(kind, ids)| ids.iter().map(move |id| EntityRef::new(kind, *id)))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.refs.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub locale: Option<String>,
    pub data: String,
    pub related: Related,
}

impl ExtractionResult {
    /// Locale body to store, the quoted display name when the extractor gave none.
    pub fn locale_or_name(&self, name: &str) -> String {
        self.locale.clone().unwrap_or_else(|| quoted(name))
    }
}

pub trait Extractor: Sync {
    fn kind(&self) -> EntityType;

    fn extract(&self, page: &Page, entity: EntityRef, name: &str) -> Result<ExtractionResult>;
}

pub fn extractor_for(kind: EntityType) -> &'static dyn Extractor {
    match kind {
        EntityType::Item => &item::ItemExtractor,
        EntityType::Npc => &npc::NpcExtractor,
        EntityType::Object => &object::ObjectExtractor,
        EntityType::Quest => &quest::QuestExtractor,
    }
}

/// What a fetched detail page resolved to.
#[derive(Debug)]
pub enum Extracted {
    Found {
        name: String,
        result: ExtractionResult,
    },
    /// The page yielded no display name.
    NotFound,
}

/// Parse `html` and run the registered extractor for `entity`'s type.
pub fn extract_document(entity: EntityRef, html: &str) -> Result<Extracted> {
    let page = Page::parse(html);
    let Some(name) = page.display_name() else {
        return Ok(Extracted::NotFound);
    };
    let result = extractor_for(entity.kind).extract(&page, entity, &name)?;
    Ok(Extracted::Found { name, result })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_deduplicates_in_order() {
        let mut related = Related::new();
        related.extend(EntityType::Npc, [5, 3, 5, 9]);
        related.add(EntityType::Object, 1);
        related.add(EntityType::Npc, 3);
        assert_eq!(related.ids(EntityType::Npc), vec![5, 3, 9]);
        assert_eq!(related.total(), 4);
        let kinds: Vec<EntityType> = related.groups().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![EntityType::Npc, EntityType::Object]);
    }

    #[test]
    fn empty_groups_are_skipped() {
        let mut related = Related::new();
        related.extend(EntityType::Quest, []);
        related.add(EntityType::Item, 2);
        assert_eq!(related.entities(), vec![EntityRef::new(EntityType::Item, 2)]);
    }

    #[test]
    fn registry_dispatches_by_type() {
        for kind in EntityType::ALL {
            assert_eq!(extractor_for(kind).kind(), kind);
        }
    }

    #[test]
    fn page_without_name_is_not_found() {
        let html = "<html><body><h1>Database</h1></body></html>";
        let entity = EntityRef::new(EntityType::Object, 4);
        assert!(matches!(
            extract_document(entity, html).unwrap(),
            Extracted::NotFound
        ));
    }

    #[test]
    fn default_locale_is_quoted_name() {
        let result = ExtractionResult {
            locale: None,
            data: "{\n  }".to_string(),
            related: Related::new(),
        };
        assert_eq!(result.locale_or_name("Chest"), "\"Chest\"");
    }
}
