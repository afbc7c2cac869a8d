//! DOM helpers shared by the per-type extractors.
//!
//! Detail pages follow one layout across entity types: an `h1` title, an `.infobox`
//! with `Key: value` rows and titled sections, map markers under `#locations`, and
//! list views embedded as script calls under `.main-contents`.

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::entity::{EntityRef, EntityType};
use crate::serializer::build_table;

pub struct Page {
    html: Html,
}

impl Page {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Title of the first `h1` without its trailing `" - <type>"` segment.
    pub fn display_name(&self) -> Option<String> {
        let h1 = self.select("h1").into_iter().next()?;
        let title: String = h1.text().collect();
        let mut parts: Vec<&str> = title.split(" - ").collect();
        parts.pop();
        let name = parts.join(" - ");
        (!name.is_empty()).then_some(name)
    }

    /// `Key: value<br>value` rows of the infobox, values trimmed, empties dropped.
    pub fn infobox(&self) -> Infobox {
        let mut rows = HashMap::new();
        for div in self.select(".infobox ul div") {
            let inner = div.inner_html();
            let Some((key, rest)) = inner.split_once(':') else {
                continue;
            };
            let Some(key) = trim_text(key) else { continue };
            let values = rest.split("<br>").filter_map(trim_text).collect();
            rows.insert(key, values);
        }
        Infobox { rows }
    }

    /// Outer HTML of the `elem` nodes in the infobox section titled `section`.
    /// The section's content is the first child of the row after the title row.
    pub fn section_rows(&self, section: &str, elem: &str) -> Vec<String> {
        let Ok(inner) = Selector::parse(elem) else {
            return Vec::new();
        };
        let title_row = self
            .select(".infobox tr")
            .into_iter()
            .find(|tr| tr.text().collect::<String>() == section);
        let Some(content) = title_row
            .and_then(|tr| tr.next_siblings().find_map(ElementRef::wrap))
            .and_then(|row| row.children().find_map(ElementRef::wrap))
        else {
            return Vec::new();
        };
        content.select(&inner).map(|el| el.html()).collect()
    }

    /// Numbered coordinate table from the `#locations` map markers, `None` when the
    /// page has no markers.
    pub fn mapper_coords(&self) -> Option<String> {
        let coords: Vec<String> = self
            .select("#locations a")
            .into_iter()
            .flat_map(|a| parse_mapper_call(&a.html()))
            .collect();
        if coords.is_empty() {
            return None;
        }
        Some(build_table(
            "    ",
            coords
                .into_iter()
                .enumerate()
                .map(|(i, c)| (i + 1, Some(c))),
        ))
    }

    /// Row bodies of the list view `id`, from the last script under `.main-contents`.
    pub fn listview_rows(&self, id: &str) -> Option<Vec<String>> {
        let script = self.select(".main-contents > script").into_iter().last()?;
        let text = script.inner_html();
        let pattern = format!(
            r"new Listview\(\{{template:'\w+',id:'{}'[^;]*,data:\[\{{([^;]*)\}}\]\}}\);",
            regex::escape(id)
        );
        let re = Regex::new(&pattern).ok()?;
        let body = re.captures(&text)?.get(1)?.as_str();
        Some(body.split("},{").map(str::to_string).collect())
    }

    /// Trimmed text of the node right after the first element matching `css`
    /// whose own text satisfies `title`.
    pub fn text_after<F>(&self, css: &str, title: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        let heading = self
            .select(css)
            .into_iter()
            .find(|el| title(&el.text().collect::<String>()))?;
        let sibling = heading.next_sibling()?;
        let text = match sibling.value() {
            Node::Text(t) => (**t).to_string(),
            Node::Element(_) => ElementRef::wrap(sibling)?.text().collect(),
            _ => return None,
        };
        trim_text(&text)
    }
}

pub struct Infobox {
    rows: HashMap<String, Vec<String>>,
}

impl Infobox {
    pub fn values(&self, key: &str) -> &[String] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }
}

/// Line breaks to spaces, runs of spaces collapsed, ends trimmed. Empty text is `None`.
pub fn trim_text(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for ch in s.chars() {
        let ch = if ch == '\n' || ch == '\r' { ' ' } else { ch };
        if ch == ' ' {
            if last_space {
                continue;
            }
            last_space = true;
        } else {
            last_space = false;
        }
        out.push(ch);
    }
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn link_pattern() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(r"\?(\w+)=(\d+)").expect("static pattern"))
}

/// First `?<type>=<id>` link target in an HTML fragment.
pub fn match_entity_link(fragment: &str) -> Option<EntityRef> {
    let caps = link_pattern().captures(fragment)?;
    let kind = EntityType::from_route(caps.get(1)?.as_str())?;
    let id = caps.get(2)?.as_str().parse().ok()?;
    Some(EntityRef::new(kind, id))
}

/// Group non-quest references by their key letter, keys in order of first
/// appearance, ids deduplicated in order.
pub fn group_by_key(refs: &[EntityRef]) -> Vec<(&'static str, Vec<u32>)> {
    let mut groups: IndexMap<&'static str, Vec<u32>> = IndexMap::new();
    for entity in refs {
        let Some(key) = entity.kind.group_key() else {
            continue;
        };
        let ids = groups.entry(key).or_default();
        if !ids.contains(&entity.id) {
            ids.push(entity.id);
        }
    }
    groups.into_iter().collect()
}

fn mapper_patterns() -> &'static (Regex, Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"myMapper.update\(([^;]*)\);").expect("static pattern"),
            Regex::new(r"zone: (\d+),").expect("static pattern"),
            Regex::new(r"\[[^\]]+\]").expect("static pattern"),
            Regex::new(r"(\d+(?:\.\d+)?),(\d+(?:\.\d+)?).*type:'(\d)'").expect("static pattern"),
        )
    })
}

/// `{ x, y, zone, type }` tuples from one `myMapper.update(...)` call.
fn parse_mapper_call(html: &str) -> Vec<String> {
    let (call, zone, point, fields) = mapper_patterns();
    let Some(data) = call.captures(html).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    let data = data.as_str();
    let Some(z) = zone.captures(data).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    point
        .find_iter(data)
        .filter_map(|m| {
            let caps = fields.captures(m.as_str())?;
            Some(format!(
                "{{ {}, {}, {}, {} }}",
                &caps[1],
                &caps[2],
                z.as_str(),
                &caps[3]
            ))
        })
        .collect()
}
