use super::{ExtractionResult, Extractor, Page, Related};
use crate::entity::{EntityRef, EntityType};
use crate::errors::Result;
use crate::serializer::build_table;

pub struct ObjectExtractor;

impl Extractor for ObjectExtractor {
    fn kind(&self) -> EntityType {
        EntityType::Object
    }

    fn extract(&self, page: &Page, _entity: EntityRef, _name: &str) -> Result<ExtractionResult> {
        Ok(ExtractionResult {
            locale: None,
            data: build_table("  ", [("coords", page.mapper_coords())]),
            related: Related::new(),
        })
    }
}
