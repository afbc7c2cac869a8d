//! Items: who drops them, who sells them, which objects contain them.

use std::sync::OnceLock;

use regex::Regex;

use super::{ExtractionResult, Extractor, Page, Related};
use crate::entity::{EntityRef, EntityType};
use crate::errors::Result;
use crate::serializer::build_table;

/// Drops and containers carry no chance data upstream; recorded as certain.
const IMPLICIT_CHANCE: &str = "100.00";

pub struct ItemExtractor;

fn patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"id: (\d+)").expect("static pattern"),
            Regex::new(r"stock: (\d+)").expect("static pattern"),
        )
    })
}

fn row_id(row: &str) -> Option<u32> {
    patterns().0.captures(row)?.get(1)?.as_str().parse().ok()
}

fn row_stock(row: &str) -> u32 {
    patterns()
        .1
        .captures(row)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn listview_ids(page: &Page, id: &str) -> Vec<u32> {
    page.listview_rows(id)
        .unwrap_or_default()
        .iter()
        .filter_map(|row| row_id(row))
        .collect()
}

fn chance_table(ids: &[u32]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(build_table(
        "    ",
        ids.iter().map(|id| (*id, Some(IMPLICIT_CHANCE.to_string()))),
    ))
}

impl Extractor for ItemExtractor {
    fn kind(&self) -> EntityType {
        EntityType::Item
    }

    fn extract(&self, page: &Page, _entity: EntityRef, _name: &str) -> Result<ExtractionResult> {
        let dropped_by = listview_ids(page, "dropped-by");
        let contained_in = listview_ids(page, "contained-in-object");
        let sold_by: Vec<(u32, u32)> = page
            .listview_rows("sold-by")
            .unwrap_or_default()
            .iter()
            .filter_map(|row| Some((row_id(row)?, row_stock(row))))
            .collect();

        let vendors = if sold_by.is_empty() {
            None
        } else {
            Some(build_table(
                "    ",
                sold_by
                    .iter()
                    .map(|(id, stock)| (*id, Some(stock.to_string()))),
            ))
        };

        let data = build_table(
            "  ",
            [
                ("U", chance_table(&dropped_by)),
                ("V", vendors),
                ("O", chance_table(&contained_in)),
            ],
        );

        let mut related = Related::new();
        related.extend(EntityType::Object, contained_in);
        related.extend(
            EntityType::Npc,
            dropped_by
                .iter()
                .copied()
                .chain(sold_by.iter().map(|(id, _)| *id)),
        );

        Ok(ExtractionResult {
            locale: None,
            data,
            related,
        })
    }
}
