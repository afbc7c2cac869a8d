//! # Crawler
//!
//! Resolves entities depth-first: an id and every entity it references are written
//! before the next id of the input list is looked at. References form cycles (a quest
//! names its giver, the giver's page names the quest), so each run carries a
//! [`CrawlContext`] whose visited set stops any `(type, id)` from being resolved twice.
//!
//! For each entity the checks run in this order:
//!
//! 1. already resolved in this run: skip
//! 2. covered by the baseline dataset: skip, regardless of the conflict policy
//! 3. present in both local tables: apply the [`ConflictPolicy`]
//! 4. fetch the detail page; no display name means not found
//! 5. extract, merge the locale entry then the data entry, mark visited
//! 6. queue the related entities ahead of everything still pending
//!
//! The traversal uses an explicit stack rather than recursion, so deep reference
//! chains do not grow the call stack.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::baseline::BaselineCache;
use crate::entity::{EntityRef, EntityType};
use crate::errors::{ExtractError, Result};
use crate::extract::{extract_document, Extracted, Related};
use crate::fetch::DocumentSource;
use crate::store::{TableStore, Variant};

/// What to do with an id that is already present in both local tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Ask the operator for each such id.
    #[default]
    Ask,
    /// Keep the local entries untouched.
    Skip,
    /// Re-extract and replace the local entries.
    Overwrite,
}

/// Operator confirmation for overwriting entries already present locally.
pub trait Confirm: Send {
    fn confirm_overwrite(&mut self, entity: EntityRef) -> Result<bool>;
}

/// Interactive yes/no prompt on the terminal, defaulting to no.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm_overwrite(&mut self, entity: EntityRef) -> Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(format!("Entry {entity} is already present. Overwrite?"))
            .default(false)
            .interact()
            .map_err(|e| ExtractError::Io(std::io::Error::other(e.to_string())))
    }
}

/// How one entity was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Extracted,
    AlreadyVisited,
    InBaseline,
    AlreadyPresent,
    Declined,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub extracted: usize,
    pub in_baseline: usize,
    pub already_present: usize,
    pub declined: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl CrawlSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Extracted => self.extracted += 1,
            Outcome::InBaseline => self.in_baseline += 1,
            Outcome::AlreadyPresent => self.already_present += 1,
            Outcome::Declined => self.declined += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::AlreadyVisited => {}
        }
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} extracted, {} in baseline, {} already present, {} declined, {} not found, {} failed",
            self.extracted,
            self.in_baseline,
            self.already_present,
            self.declined,
            self.not_found,
            self.failed
        )
    }
}

/// State that lives for one run: what has been resolved and the baseline datasets.
#[derive(Debug, Default)]
pub struct CrawlContext {
    visited: HashSet<EntityRef>,
    baseline: BaselineCache,
    order: Vec<EntityRef>,
    pub summary: CrawlSummary,
}

impl CrawlContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, entity: EntityRef) -> bool {
        self.visited.contains(&entity)
    }

    /// Entities extracted and written in this run, in write order.
    pub fn extracted(&self) -> &[EntityRef] {
        &self.order
    }
}

pub struct Crawler {
    source: Arc<dyn DocumentSource>,
    store: TableStore,
    policy: ConflictPolicy,
    confirm: Box<dyn Confirm>,
}

impl Crawler {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: TableStore,
        policy: ConflictPolicy,
        confirm: Box<dyn Confirm>,
    ) -> Self {
        Self {
            source,
            store,
            policy,
            confirm,
        }
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Resolve `ids` of `kind` and everything they reference, depth-first.
    pub async fn crawl(&mut self, ctx: &mut CrawlContext, kind: EntityType, ids: &[u32]) -> Result<()> {
        if ids.is_empty() {
            warn!("No {} ids given, nothing to extract", kind);
            return Ok(());
        }

        let mut stack: Vec<EntityRef> = ids.iter().rev().map(|id| EntityRef::new(kind, *id)).collect();
        while let Some(entity) = stack.pop() {
            let (outcome, related) = self.visit(ctx, entity).await?;
            ctx.summary.record(outcome);
            if let Some(related) = related {
                stack.extend(related.entities().into_iter().rev());
            }
        }
        Ok(())
    }

    async fn visit(&mut self, ctx: &mut CrawlContext, entity: EntityRef) -> Result<(Outcome, Option<Related>)> {
        if ctx.visited.contains(&entity) {
            debug!("Skipping {}, already handled this run", entity);
            return Ok((Outcome::AlreadyVisited, None));
        }

        if ctx
            .baseline
            .contains(self.source.as_ref(), entity.kind, entity.id)
            .await?
        {
            info!("Skipping {}, present in baseline database", entity);
            ctx.visited.insert(entity);
            return Ok((Outcome::InBaseline, None));
        }

        let present = self
            .store
            .contains(entity.kind, Variant::Locale, entity.id)
            .await?
            && self
                .store
                .contains(entity.kind, Variant::Data, entity.id)
                .await?;
        if present {
            let overwrite = match self.policy {
                ConflictPolicy::Overwrite => true,
                ConflictPolicy::Skip => false,
                ConflictPolicy::Ask => self.confirm.confirm_overwrite(entity)?,
            };
            if !overwrite {
                info!("Skipping {}, already present", entity);
                ctx.visited.insert(entity);
                let outcome = match self.policy {
                    ConflictPolicy::Ask => Outcome::Declined,
                    _ => Outcome::AlreadyPresent,
                };
                return Ok((outcome, None));
            }
            info!("Overwriting {}", entity);
        }

        info!("Loading {}", entity);
        let html = match self.source.fetch_detail(entity).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to load {}: {} (skipping)", entity, e);
                return Ok((Outcome::Failed, None));
            }
        };

        let (name, result) = match extract_document(entity, &html) {
            Ok(Extracted::Found { name, result }) => (name, result),
            Ok(Extracted::NotFound) => {
                warn!("{}", ExtractError::NotFound(entity));
                return Ok((Outcome::NotFound, None));
            }
            Err(e) if !e.is_fatal() => {
                warn!("Failed to extract {}: {} (skipping)", entity, e);
                return Ok((Outcome::Failed, None));
            }
            Err(e) => return Err(e),
        };

        self.store
            .merge(
                entity.kind,
                Variant::Locale,
                entity.id,
                &result.locale_or_name(&name),
                None,
            )
            .await?;
        self.store
            .merge(entity.kind, Variant::Data, entity.id, &result.data, Some(&name))
            .await?;
        ctx.visited.insert(entity);
        ctx.order.push(entity);

        log_related(entity, &name, &result.related);
        Ok((Outcome::Extracted, Some(result.related)))
    }
}

fn log_related(entity: EntityRef, name: &str, related: &Related) {
    if related.is_empty() {
        info!("Extracted {} \"{}\", no related entities", entity, name);
        return;
    }
    let groups: Vec<String> = related
        .groups()
        .map(|(kind, ids)| format!("{} {}", ids.len(), kind))
        .collect();
    info!(
        "Extracted {} \"{}\", found {} related entities ({})",
        entity,
        name,
        related.total(),
        groups.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_ignores_revisits() {
        let mut summary = CrawlSummary::default();
        summary.record(Outcome::Extracted);
        summary.record(Outcome::AlreadyVisited);
        summary.record(Outcome::NotFound);
        assert_eq!(summary.extracted, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(
            summary.to_string(),
            "1 extracted, 0 in baseline, 0 already present, 0 declined, 1 not found, 0 failed"
        );
    }

    #[test]
    fn ask_is_the_default_policy() {
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::Ask);
    }
}
