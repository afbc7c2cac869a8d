//! Remote documents: detail pages per entity and baseline datasets per category.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::timeout;

use crate::config::SourceConfig;
use crate::entity::{EntityRef, EntityType};
use crate::errors::{ExtractError, Result};

/// Where the crawler gets its raw text from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// HTML of the detail page for one entity.
    async fn fetch_detail(&self, entity: EntityRef) -> Result<String>;

    /// Full text of the baseline dataset for one category.
    async fn fetch_baseline(&self, kind: EntityType) -> Result<String>;
}

pub struct HttpSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn detail_url(&self, entity: EntityRef) -> String {
        format!("{}?{}={}", self.config.detail_url, entity.kind.route(), entity.id)
    }

    pub fn baseline_url(&self, kind: EntityType) -> String {
        format!("{}{}s.lua", self.config.baseline_url, kind.file_stem())
    }

    /// GET `url` and read the body, both bounded by one `timeout_seconds` deadline.
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let seconds = self.config.timeout_seconds;
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExtractError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        };
        timeout(Duration::from_secs(seconds), request)
            .await
            .map_err(|_| ExtractError::Timeout {
                url: url.to_string(),
                seconds,
            })?
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch_detail(&self, entity: EntityRef) -> Result<String> {
        self.get_text(&self.detail_url(entity)).await
    }

    async fn fetch_baseline(&self, kind: EntityType) -> Result<String> {
        self.get_text(&self.baseline_url(kind)).await
    }
}
