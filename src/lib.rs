//! # dbextract - pfDB table extraction for community database pages
//!
//! dbextract crawls per-entity detail pages of a community game-content database and
//! merges the records it extracts into the pfDB table files consumed by the quest
//! helper addon. Tables stay sorted by id, hold each id once, and never duplicate an
//! entry the upstream baseline dataset already covers.
//!
//! ## Features
//!
//! - **Recursive crawl**: an item pulls in the NPCs that drop or sell it, a quest pulls
//!   in its givers, objectives and chain, each resolved once per run.
//! - **Sorted merge**: every write re-sorts the table and keeps the newest entry per id.
//! - **Baseline awareness**: ids present in the upstream dataset are always skipped.
//! - **Conflict policy**: ask, skip or overwrite ids already present locally.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dbextract::config::Config;
//! use dbextract::crawler::{CrawlContext, Crawler, TerminalConfirm};
//! use dbextract::entity::EntityType;
//! use dbextract::fetch::HttpSource;
//! use dbextract::store::TableStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("dbextract.toml").await?;
//!     let source = Arc::new(HttpSource::new(config.source.clone())?);
//!     let store = TableStore::from_config(&config.storage);
//!     let mut crawler = Crawler::new(source, store, config.crawl.conflict, Box::new(TerminalConfirm));
//!
//!     let mut ctx = CrawlContext::new();
//!     crawler.crawl(&mut ctx, EntityType::Quest, &[40001]).await?;
//!     println!("{}", ctx.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`crawler`] - Depth-first crawl, run context and conflict policy
//! - [`extract`] - Per-type extractors and page helpers
//! - [`store`] - Table files and the sorted merge
//! - [`baseline`] - Cached upstream datasets
//! - [`fetch`] - Remote document source
//! - [`serializer`] - Table-literal rendering
//! - [`config`] - Configuration loading
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │     Crawler     │ ← Visit order, skip rules
//! └─────────────────┘
//!     │         │
//! ┌────────┐ ┌──────────┐
//! │ Fetch  │ │ Extract  │ ← Remote pages, parsing
//! └────────┘ └──────────┘
//!          │
//! ┌─────────────────┐
//! │   Table Store   │ ← Sorted, deduplicated files
//! └─────────────────┘
//! ```

pub mod baseline;
pub mod config;
pub mod crawler;
pub mod entity;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod logutil;
pub mod serializer;
pub mod store;
