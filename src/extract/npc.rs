use super::{ExtractionResult, Extractor, Page, Related};
use crate::entity::{EntityRef, EntityType};
use crate::errors::Result;
use crate::serializer::{build_table, quoted};

pub struct NpcExtractor;

/// `"10 - 12"` becomes `"10-12"`.
pub fn normalize_level(level: &str) -> String {
    level.split(" - ").collect::<Vec<_>>().join("-")
}

impl Extractor for NpcExtractor {
    fn kind(&self) -> EntityType {
        EntityType::Npc
    }

    fn extract(&self, page: &Page, _entity: EntityRef, _name: &str) -> Result<ExtractionResult> {
        let faction = page
            .select(".q2")
            .first()
            .map(|el| el.text().collect::<String>())
            .filter(|f| !f.is_empty());
        let level = page.infobox().first("Level").map(normalize_level);

        let data = build_table(
            "  ",
            [
                ("fac", faction.as_deref().map(quoted)),
                ("lvl", level.as_deref().map(quoted)),
                ("coords", page.mapper_coords()),
            ],
        );

        Ok(ExtractionResult {
            locale: None,
            data,
            related: Related::new(),
        })
    }
}
