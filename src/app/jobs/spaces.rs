use crate::adapters::http::ConfluenceClient;
use crate::app::jobs::{list_spaces, wiki_base_url, wiki_client};
use crate::core::snapshot::write_snapshot;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Space, SpaceInventory, SpaceSummary};
use crate::utils::error::Result;

pub const SPACES_FILE: &str = "confluence_spaces.json";

pub struct SpacesPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: ConfluenceClient,
}

impl<S: Storage, C: ConfigProvider> SpacesPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = wiki_client(&config)?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SpacesPipeline<S, C> {
    type Extracted = Vec<Space>;
    type Report = SpaceInventory;

    fn name(&self) -> &str {
        "spaces"
    }

    async fn extract(&self) -> Result<Vec<Space>> {
        let base_url = wiki_base_url(&self.config)?;
        list_spaces(&self.client, &base_url, self.config.page_limit()).await
    }

    async fn transform(&self, data: Vec<Space>) -> Result<SpaceInventory> {
        let spaces: Vec<SpaceSummary> = data.iter().map(SpaceSummary::from).collect();
        Ok(SpaceInventory {
            total_spaces: spaces.len(),
            spaces,
        })
    }

    async fn load(&self, report: SpaceInventory) -> Result<String> {
        write_snapshot(&self.storage, SPACES_FILE, &report).await
    }
}
