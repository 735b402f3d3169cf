use crate::adapters::http::ConfluenceClient;
use crate::app::jobs::{list_space_pages_optional, list_spaces, wiki_base_url, wiki_client};
use crate::core::pagination::{fetch_all_optional, RestPage};
use crate::core::snapshot::write_snapshot;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Page, PageRestrictions, Space, SpaceAccessReport};
use crate::utils::error::Result;
use serde_json::{Map, Value};

pub const PERMISSIONS_FILE: &str = "confluence_permissions_and_restrictions_data.json";

/// 單一空間的擷取結果
#[derive(Debug)]
pub enum SpaceAccess {
    /// 個人空間或排除清單中的空間，只輸出基本資料
    Skipped(Space),
    /// 頁面清單回傳 404，整個空間不列入輸出
    PagesMissing(Space),
    Audited {
        space: Space,
        permissions: Vec<Value>,
        pages: Vec<(Page, Value)>,
    },
}

impl SpaceAccess {
    fn into_report(self) -> Option<SpaceAccessReport> {
        match self {
            SpaceAccess::Skipped(space) => Some(SpaceAccessReport::header_only(&space)),
            SpaceAccess::PagesMissing(_) => None,
            SpaceAccess::Audited {
                space,
                permissions,
                pages,
            } => {
                let mut report = SpaceAccessReport::header_only(&space);
                report.space_permissions = Some(permissions);
                report.space_pages = Some(
                    pages
                        .into_iter()
                        .map(|(page, restrictions)| PageRestrictions {
                            page_name: page.title,
                            page_id: page.id,
                            page_restrictions: restrictions,
                        })
                        .collect(),
                );
                Some(report)
            }
        }
    }
}

/// 空間權限與頁面限制
pub struct PermissionsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: ConfluenceClient,
}

impl<S: Storage, C: ConfigProvider> PermissionsPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = wiki_client(&config)?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    fn is_audited(&self, space: &Space) -> bool {
        if space.is_personal() && !self.config.include_personal_spaces() {
            return false;
        }
        !self
            .config
            .excluded_space_names()
            .iter()
            .any(|name| name == &space.name)
    }

    async fn audit_space(&self, base_url: &str, space: Space) -> Result<SpaceAccess> {
        let limit = [("limit", self.config.page_limit().to_string())];

        let permissions = fetch_all_optional::<RestPage<Value>>(
            &self.client,
            &format!("{}/api/v2/spaces/{}/permissions", base_url, space.id),
            &limit,
        )
        .await?
        .unwrap_or_default();

        let pages = match list_space_pages_optional(
            &self.client,
            base_url,
            &space.key,
            self.config.page_limit(),
        )
        .await?
        {
            Some(pages) => pages,
            None => {
                tracing::warn!("Pages of space '{}' not found, skipping space", space.key);
                return Ok(SpaceAccess::PagesMissing(space));
            }
        };

        let mut audited_pages = Vec::with_capacity(pages.len());
        for page in pages {
            let restrictions = self
                .client
                .get_json_optional::<Value>(
                    &format!(
                        "{}/rest/api/content/{}/restriction/byOperation",
                        base_url, page.id
                    ),
                    &[],
                )
                .await?
                .unwrap_or_else(|| Value::Object(Map::new()));
            audited_pages.push((page, restrictions));
        }

        tracing::debug!(
            "Space {}: {} permissions, {} pages",
            space.key,
            permissions.len(),
            audited_pages.len()
        );

        Ok(SpaceAccess::Audited {
            space,
            permissions,
            pages: audited_pages,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PermissionsPipeline<S, C> {
    type Extracted = Vec<SpaceAccess>;
    type Report = Vec<SpaceAccessReport>;

    fn name(&self) -> &str {
        "permissions"
    }

    async fn extract(&self) -> Result<Vec<SpaceAccess>> {
        let base_url = wiki_base_url(&self.config)?;
        let spaces = list_spaces(&self.client, &base_url, self.config.page_limit()).await?;

        let mut results = Vec::with_capacity(spaces.len());
        for space in spaces {
            if self.is_audited(&space) {
                results.push(self.audit_space(&base_url, space).await?);
            } else {
                tracing::debug!("Skipping space {} ({})", space.key, space.space_type);
                results.push(SpaceAccess::Skipped(space));
            }
        }
        Ok(results)
    }

    async fn transform(&self, data: Vec<SpaceAccess>) -> Result<Vec<SpaceAccessReport>> {
        let total = data.len();
        let reports: Vec<SpaceAccessReport> =
            data.into_iter().filter_map(SpaceAccess::into_report).collect();
        if reports.len() < total {
            tracing::warn!("{} spaces dropped from the snapshot", total - reports.len());
        }
        Ok(reports)
    }

    async fn load(&self, report: Vec<SpaceAccessReport>) -> Result<String> {
        write_snapshot(&self.storage, PERMISSIONS_FILE, &report).await
    }
}
