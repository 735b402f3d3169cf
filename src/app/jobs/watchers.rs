use crate::adapters::http::ConfluenceClient;
use crate::app::jobs::{
    graphql_endpoint, list_space_pages, list_spaces, wiki_base_url, wiki_client,
};
use crate::core::pagination::{fetch_connection, ConnectionQuery};
use crate::core::snapshot::write_snapshot;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{PageWatchers, SpaceWatchersReport};
use crate::utils::error::Result;
use serde_json::{json, Value};

pub const WATCHERS_FILE: &str = "confluence_space_and_page_watchers_data.json";

const WATCHERS_PER_REQUEST: u32 = 20;

// 兩個查詢共用同一個 userNodeFragment
const SPACE_WATCHERS_DOCUMENT: &str = r#"query SpaceWatchersQuery($spaceKey: String, $spaceId: ID, $offset: Int, $after: String, $first: Int = 20) {
  spaceWatchers(spaceKey: $spaceKey, spaceId: $spaceId, offset: $offset, after: $after, first: $first) {
    count
    nodes {
      ...userNodeFragment
      __typename
    }
    pageInfo {
      hasNextPage
      endCursor
      __typename
    }
    __typename
  }
}
fragment userNodeFragment on Person {
  ... on KnownUser {
    accountId
    __typename
  }
  ... on UnknownUser {
    accountId
    __typename
  }
  ... on User {
    accountId
    __typename
  }
  displayName
  permissionType
  profilePicture {
    path
    __typename
  }
  __typename
}"#;

const CONTENT_WATCHERS_DOCUMENT: &str = r#"query ContentWatchersQuery($contentId: ID!, $offset: Int, $after: String, $first: Int = 20) {
  contentWatchers(contentId: $contentId, offset: $offset, after: $after, first: $first) {
    count
    nodes {
      ...userNodeFragment
      __typename
    }
    pageInfo {
      hasNextPage
      endCursor
      __typename
    }
    __typename
  }
}
fragment userNodeFragment on Person {
  ... on KnownUser {
    accountId
    __typename
  }
  ... on UnknownUser {
    accountId
    __typename
  }
  ... on User {
    accountId
    __typename
  }
  displayName
  permissionType
  profilePicture {
    path
    __typename
  }
  __typename
}"#;

pub struct SpaceWatchersQuery {
    pub space_key: String,
}

impl ConnectionQuery for SpaceWatchersQuery {
    fn operation_name(&self) -> &'static str {
        "SpaceWatchersQuery"
    }

    fn root_field(&self) -> &'static str {
        "spaceWatchers"
    }

    fn document(&self) -> &'static str {
        SPACE_WATCHERS_DOCUMENT
    }

    fn variables(&self, after: Option<&str>) -> Value {
        json!({
            "first": WATCHERS_PER_REQUEST,
            "spaceKey": self.space_key,
            "after": after,
        })
    }
}

pub struct ContentWatchersQuery {
    pub content_id: String,
}

impl ConnectionQuery for ContentWatchersQuery {
    fn operation_name(&self) -> &'static str {
        "ContentWatchersQuery"
    }

    fn root_field(&self) -> &'static str {
        "contentWatchers"
    }

    fn document(&self) -> &'static str {
        CONTENT_WATCHERS_DOCUMENT
    }

    fn variables(&self, after: Option<&str>) -> Value {
        json!({
            "first": WATCHERS_PER_REQUEST,
            "contentId": self.content_id,
            "after": after,
        })
    }
}

/// 空間與頁面關注者
pub struct WatchersPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: ConfluenceClient,
}

impl<S: Storage, C: ConfigProvider> WatchersPipeline<S, C> {
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
impl<S: Storage, C: ConfigProvider> Pipeline for WatchersPipeline<S, C> {
    type Extracted = Vec<SpaceWatchersReport>;
    type Report = Vec<SpaceWatchersReport>;

    fn name(&self) -> &str {
        "watchers"
    }

    async fn extract(&self) -> Result<Vec<SpaceWatchersReport>> {
        let base_url = wiki_base_url(&self.config)?;
        let endpoint = graphql_endpoint(&self.config)?;
        let page_limit = self.config.page_limit();
        tracing::debug!("GraphQL endpoint: {}", endpoint);

        let spaces = list_spaces(&self.client, &base_url, page_limit).await?;
        let mut reports = Vec::with_capacity(spaces.len());

        for space in spaces {
            let space_watchers = fetch_connection(
                &self.client,
                &endpoint,
                &SpaceWatchersQuery {
                    space_key: space.key.clone(),
                },
            )
            .await?;

            let pages = list_space_pages(&self.client, &base_url, &space.key, page_limit).await?;
            let mut space_pages = Vec::with_capacity(pages.len());
            for page in pages {
                let page_watchers = fetch_connection(
                    &self.client,
                    &endpoint,
                    &ContentWatchersQuery {
                        content_id: page.id.to_string(),
                    },
                )
                .await?;
                space_pages.push(PageWatchers {
                    page_name: page.title,
                    page_id: page.id,
                    page_watchers,
                });
            }

            tracing::debug!(
                "Space {}: {} watchers, {} pages",
                space.key,
                space_watchers.count,
                space_pages.len()
            );

            reports.push(SpaceWatchersReport {
                space_name: space.name,
                space_id: space.id,
                space_type: space.space_type,
                space_watchers,
                space_pages,
            });
        }

        Ok(reports)
    }

    async fn transform(&self, data: Vec<SpaceWatchersReport>) -> Result<Vec<SpaceWatchersReport>> {
        let page_count: usize = data.iter().map(|space| space.space_pages.len()).sum();
        tracing::info!("Collected watchers for {} spaces and {} pages", data.len(), page_count);
        Ok(data)
    }

    async fn load(&self, report: Vec<SpaceWatchersReport>) -> Result<String> {
        write_snapshot(&self.storage, WATCHERS_FILE, &report).await
    }
}
