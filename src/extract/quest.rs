//! Quests: texts, givers and enders, objectives, requirements, and the chain they
//! belong to.
//!
//! Prerequisites and follow-ups come from two places: the explicit "Requires" and
//! "Open Quests" sections, and the quest's position in its "Series". The series lists
//! the whole chain with every quest linked except the current one, so rows before the
//! unlinked row are prerequisites and rows after it are follow-ups.

use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;

use super::page::{group_by_key, match_entity_link};
use super::{ExtractionResult, Extractor, Page, Related};
use crate::entity::{EntityRef, EntityType};
use crate::errors::{ExtractError, Result};
use crate::serializer::{build_table, inline_list, quoted};

pub struct QuestExtractor;

/// High elf and goblin masks are folded into their faction's generic mask.
pub fn correct_race_mask(raw: u32) -> u32 {
    match raw {
        512 => 77,
        256 => 178,
        other => other,
    }
}

/// Rows before the current (unlinked) row, and rows after it. A series without an
/// unlinked row contributes nothing.
pub fn split_series(rows: &[String]) -> (&[String], &[String]) {
    match rows.iter().position(|row| !row.contains("<a href")) {
        Some(current) => (&rows[..current], &rows[current + 1..]),
        None => (&[], &[]),
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"<([nNrRcC])(ame|AME|lass|LASS|ace|ACE)>").expect("static pattern")
    })
}

/// `<name>`, `<race>` and `<class>` markers become `$n`, `$r` and `$c`.
pub fn normalize_placeholders(text: &str) -> String {
    placeholder_pattern().replace_all(text, "$$${1}").into_owned()
}

/// Quest ids linked from `rows`, deduplicated in order.
fn quest_links<'a>(rows: impl IntoIterator<Item = &'a String>) -> IndexSet<u32> {
    rows.into_iter()
        .filter_map(|row| match_entity_link(row))
        .filter(|e| e.kind == EntityType::Quest)
        .map(|e| e.id)
        .collect()
}

fn links(values: &[String]) -> Vec<EntityRef> {
    values.iter().filter_map(|v| match_entity_link(v)).collect()
}

fn group_table(groups: &[(&'static str, Vec<u32>)]) -> String {
    build_table(
        "    ",
        groups
            .iter()
            .map(|(key, ids)| (*key, Some(inline_list(ids)))),
    )
}

fn positive_mask(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.parse().ok()).filter(|m| *m != 0)
}

impl Extractor for QuestExtractor {
    fn kind(&self) -> EntityType {
        EntityType::Quest
    }

    fn extract(&self, page: &Page, entity: EntityRef, name: &str) -> Result<ExtractionResult> {
        let infobox = page.infobox();

        let objective = page.text_after(".main-contents .text h1", |_| true);
        let description = page
            .text_after(".main-contents .text h3", |t| t == "Description")
            .map(|d| normalize_placeholders(&d));

        let start_refs = links(infobox.values("Start"));
        let end_refs = links(infobox.values("End"));
        let objective_refs: Vec<EntityRef> = page
            .select(".iconlist td")
            .iter()
            .filter_map(|td| match_entity_link(&td.inner_html()))
            .collect();
        let start = group_by_key(&start_refs);
        let end = group_by_key(&end_refs);
        let objectives = group_by_key(&objective_refs);

        let race = positive_mask(infobox.first("Race Mask")).map(correct_race_mask);
        let class = positive_mask(infobox.first("Class Mask"));
        let level = infobox.first("Level").map(str::to_string);
        let min_level = infobox
            .first("Requires level")
            .map(str::to_string)
            .ok_or(ExtractError::MissingField {
                entity,
                field: "Requires level",
            })?;

        let series = page.section_rows("Series", "td");
        let (before, after) = split_series(&series);
        let prerequisites = quest_links(page.section_rows("Requires", "li").iter().chain(before));
        let follow_ups = quest_links(page.section_rows("Open Quests", "li").iter().chain(after));

        let locale = build_table(
            "  ",
            [
                ("T", Some(quoted(name))),
                ("O", objective.as_deref().map(quoted)),
                ("D", description.as_deref().map(quoted)),
            ],
        );

        let data = build_table(
            "  ",
            [
                ("start", Some(group_table(&start))),
                ("end", Some(group_table(&end))),
                (
                    "obj",
                    (!objectives.is_empty()).then(|| group_table(&objectives)),
                ),
                ("race", race.map(|r| r.to_string())),
                ("class", class.map(|c| c.to_string())),
                ("lvl", level),
                ("min", Some(min_level)),
                (
                    "pre",
                    (!prerequisites.is_empty()).then(|| inline_list(&prerequisites)),
                ),
                (
                    "next",
                    (!follow_ups.is_empty()).then(|| inline_list(&follow_ups)),
                ),
            ],
        );

        let mut related = Related::new();
        related.extend(
            EntityType::Quest,
            prerequisites.iter().chain(follow_ups.iter()).copied(),
        );
        for kind in [EntityType::Item, EntityType::Object, EntityType::Npc] {
            let ids = start_refs
                .iter()
                .chain(&end_refs)
                .chain(&objective_refs)
                .filter(|e| e.kind == kind)
                .map(|e| e.id);
            related.extend(kind, ids);
        }

        Ok(ExtractionResult {
            locale: Some(locale),
            data,
            related,
        })
    }
}
