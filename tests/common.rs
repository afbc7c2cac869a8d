//! Test utilities & fixtures.
//! In-memory document source, scripted operator answers and small page builders.

#![allow(dead_code)] // Each test binary uses a different subset.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dbextract::crawler::Confirm;
use dbextract::entity::{EntityRef, EntityType};
use dbextract::errors::{ExtractError, Result};
use dbextract::fetch::DocumentSource;
use dbextract::store::TableStore;

#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<EntityRef, String>,
    baselines: HashMap<EntityType, String>,
    detail_log: Mutex<Vec<EntityRef>>,
    baseline_log: Mutex<Vec<EntityType>>,
    baseline_failures: Mutex<HashMap<EntityType, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, kind: EntityType, id: u32, html: String) -> Self {
        self.pages.insert(EntityRef::new(kind, id), html);
        self
    }

    pub fn with_baseline(mut self, kind: EntityType, ids: &[u32]) -> Self {
        let mut text = format!("pfDB[\"{}s\"][\"data\"] = {{\n", kind.file_stem());
        for id in ids {
            text.push_str(&format!("  [{id}] = {{\n  }},\n"));
        }
        text.push_str("}\n");
        self.baselines.insert(kind, text);
        self
    }

    /// The first `times` baseline requests for `kind` fail with a 503.
    pub fn with_failing_baseline(self, kind: EntityType, times: usize) -> Self {
        self.baseline_failures.lock().unwrap().insert(kind, times);
        self
    }

    pub fn fetched(&self) -> Vec<EntityRef> {
        self.detail_log.lock().unwrap().clone()
    }

    pub fn baseline_fetches(&self) -> Vec<EntityType> {
        self.baseline_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for FakeSource {
    async fn fetch_detail(&self, entity: EntityRef) -> Result<String> {
        self.detail_log.lock().unwrap().push(entity);
        self.pages.get(&entity).cloned().ok_or(ExtractError::Status {
            url: format!("fake://{}/{}", entity.kind, entity.id),
            status: 404,
        })
    }

    async fn fetch_baseline(&self, kind: EntityType) -> Result<String> {
        self.baseline_log.lock().unwrap().push(kind);
        if let Some(left) = self.baseline_failures.lock().unwrap().get_mut(&kind) {
            if *left > 0 {
                *left -= 1;
                return Err(ExtractError::Status {
                    url: format!("fake://baseline/{kind}"),
                    status: 503,
                });
            }
        }
        Ok(self
            .baselines
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| "pfDB = {\n}\n".to_string()))
    }
}

/// Operator answers consumed in order; records every prompt.
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub asked: Arc<Mutex<Vec<EntityRef>>>,
}

impl ScriptedConfirm {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm_overwrite(&mut self, entity: EntityRef) -> Result<bool> {
        self.asked.lock().unwrap().push(entity);
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

pub fn store_in(dir: &Path) -> TableStore {
    TableStore::new(dir, "enUS", "turtle")
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Top-level ids of a table text in file order.
pub fn ids_in(text: &str) -> Vec<u32> {
    text.lines()
        .filter(|line| line.starts_with("  ["))
        .filter_map(dbextract::store::entry_key)
        .collect()
}

pub fn npc_page(name: &str, level: &str) -> String {
    format!(
        r#"<html><body><h1>{name} - NPC</h1><div class="infobox"><ul><div>Level: {level}</div></ul></div></body></html>"#
    )
}

pub fn object_page(name: &str) -> String {
    format!(r#"<html><body><h1>{name} - Object</h1></body></html>"#)
}

pub fn item_page(name: &str, dropped_by: &[u32], contained_in: &[u32]) -> String {
    let rows = |ids: &[u32]| {
        ids.iter()
            .map(|id| format!("{{id: {id}}}"))
            .collect::<Vec<_>>()
            .join(",")
    };
    let mut script = String::new();
    if !dropped_by.is_empty() {
        script.push_str(&format!(
            "new Listview({{template:'npc',id:'dropped-by',data:[{}]}});\n",
            rows(dropped_by)
        ));
    }
    if !contained_in.is_empty() {
        script.push_str(&format!(
            "new Listview({{template:'object',id:'contained-in-object',data:[{}]}});\n",
            rows(contained_in)
        ));
    }
    format!(
        r#"<html><body><h1>{name} - Item</h1><div class="main-contents"><script>{script}</script></div></body></html>"#
    )
}

/// Quest page with a series in which `id` is the unlinked current row.
pub fn quest_page(name: &str, id: u32, series: &[u32], starter: u32) -> String {
    let rows: String = series
        .iter()
        .map(|q| {
            if *q == id {
                format!("<tr><td>{name}</td></tr>")
            } else {
                format!(r#"<tr><td><a href="?quest={q}">Quest {q}</a></td></tr>"#)
            }
        })
        .collect();
    format!(
        r#"<html><body><h1>{name} - Quest</h1>
<div class="main-contents"><div class="text"><h1>{name}</h1>Do the thing.<h3>Description</h3>Hello &lt;name&gt;.</div></div>
<table class="infobox"><tr><td><ul><div>Requires level: 1</div><div>Start: <a href="?npc={starter}">Starter</a></div><div>End: <a href="?npc={starter}">Starter</a></div></ul></td></tr><tr><th>Series</th></tr><tr><td><table>{rows}</table></td></tr></table>
</body></html>"#
    )
}
