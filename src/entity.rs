//! Entity kinds and references.
//!
//! Every record handled by the crawler is addressed by an [`EntityRef`]: the pair of
//! an [`EntityType`] and the positive id the upstream database assigned to it.
//! The same id can name different entities of different types, so only the pair is unique.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ExtractError;

/// The four entity kinds the upstream database exposes detail pages for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Item,
    Npc,
    Object,
    Quest,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Item,
        EntityType::Npc,
        EntityType::Object,
        EntityType::Quest,
    ];

    /// Route name used in detail page query strings (`?npc=123`).
    pub fn route(self) -> &'static str {
        match self {
            EntityType::Item => "item",
            EntityType::Npc => "npc",
            EntityType::Object => "object",
            EntityType::Quest => "quest",
        }
    }

    /// File stem of the category's table files. NPCs are stored as "units".
    pub fn file_stem(self) -> &'static str {
        match self {
            EntityType::Npc => "unit",
            other => other.route(),
        }
    }

    /// Key letter used in quest start/end/objective groups.
    pub fn group_key(self) -> Option<&'static str> {
        match self {
            EntityType::Npc => Some("U"),
            EntityType::Object => Some("O"),
            EntityType::Item => Some("I"),
            EntityType::Quest => None,
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.route() == route)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

impl FromStr for EntityType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_route(&s.to_ascii_lowercase())
            .ok_or_else(|| ExtractError::UnknownEntityType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub kind: EntityType,
    pub id: u32,
}

impl EntityRef {
    pub fn new(kind: EntityType, id: u32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npc_is_stored_as_unit() {
        assert_eq!(EntityType::Npc.file_stem(), "unit");
        assert_eq!(EntityType::Quest.file_stem(), "quest");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("NPC".parse::<EntityType>().unwrap(), EntityType::Npc);
        assert!("spell".parse::<EntityType>().is_err());
    }

    #[test]
    fn display_names_the_pair() {
        assert_eq!(EntityRef::new(EntityType::Item, 42).to_string(), "item [42]");
    }
}
