use crate::adapters::http::ConfluenceClient;
use crate::app::jobs::{wiki_base_url, wiki_client};
use crate::core::pagination::{fetch_all, RestPage};
use crate::core::snapshot::write_snapshot;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Page, RestrictionRemovalReport};
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;

pub const REMOVED_RESTRICTIONS_FILE: &str = "confluence_removed_restrictions.json";

/// 清除單一空間內所有頁面的限制
pub struct RemoveRestrictionsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: ConfluenceClient,
    space_key: String,
    dry_run: bool,
}

impl<S: Storage, C: ConfigProvider> RemoveRestrictionsPipeline<S, C> {
    pub fn new(storage: S, config: C, space_key: impl Into<String>, dry_run: bool) -> Result<Self> {
        let space_key = space_key.into();
        validate_non_empty_string("space_key", &space_key)?;
        let client = wiki_client(&config)?;
        Ok(Self {
            storage,
            config,
            client,
            space_key: space_key.trim().to_string(),
            dry_run,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RemoveRestrictionsPipeline<S, C> {
    type Extracted = Vec<Page>;
    type Report = RestrictionRemovalReport;

    fn name(&self) -> &str {
        "remove-restrictions"
    }

    async fn extract(&self) -> Result<Vec<Page>> {
        let base_url = wiki_base_url(&self.config)?;
        let pages = fetch_all::<RestPage<Page>>(
            &self.client,
            &format!("{}/rest/api/content", base_url),
            &[
                ("spaceKey", self.space_key.clone()),
                ("type", "page".to_string()),
                ("limit", self.config.page_limit().to_string()),
            ],
        )
        .await?;
        tracing::info!("Found {} pages in space {}", pages.len(), self.space_key);
        Ok(pages)
    }

    async fn transform(&self, data: Vec<Page>) -> Result<RestrictionRemovalReport> {
        Ok(RestrictionRemovalReport {
            space_key: self.space_key.clone(),
            dry_run: self.dry_run,
            pages_total: data.len(),
            pages_targeted: data.into_iter().map(|page| page.id).collect(),
            pages_cleared: Vec::new(),
        })
    }

    /// 依序刪除限制，第一個失敗即中止；dry run 只寫出報告
    async fn load(&self, mut report: RestrictionRemovalReport) -> Result<String> {
        if self.dry_run {
            tracing::info!(
                "🔎 Dry run: {} pages in {} would be cleared",
                report.pages_total,
                report.space_key
            );
        } else {
            let base_url = wiki_base_url(&self.config)?;
            for page_id in &report.pages_targeted {
                self.client
                    .delete(&format!("{}/rest/api/content/{}/restriction", base_url, page_id))
                    .await?;
                tracing::info!("Removed restrictions for page ID: {}", page_id);
                report.pages_cleared.push(page_id.clone());
            }
            tracing::info!("✅ All page restrictions removed in space {}", report.space_key);
        }

        write_snapshot(&self.storage, REMOVED_RESTRICTIONS_FILE, &report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::config::Settings;
    use crate::utils::error::EtlError;

    fn settings() -> Settings {
        Settings {
            base_url: Some("https://example.atlassian.net/wiki".to_string()),
            username: Some("ada@example.com".to_string()),
            api_token: Some("secret".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_blank_space_key_is_rejected() {
        let result = RemoveRestrictionsPipeline::new(LocalStorage::new("."), settings(), "  ", false);
        assert!(matches!(
            result,
            Err(EtlError::InvalidConfigValueError { field, .. }) if field == "space_key"
        ));
    }

    #[tokio::test]
    async fn test_transform_lists_every_page() {
        let pipeline =
            RemoveRestrictionsPipeline::new(LocalStorage::new("."), settings(), "ENG", true).unwrap();
        let pages: Vec<Page> = serde_json::from_value(serde_json::json!([
            {"id": "1", "title": "One"},
            {"id": "2", "title": "Two"}
        ]))
        .unwrap();

        let report = pipeline.transform(pages).await.unwrap();
        assert_eq!(report.space_key, "ENG");
        assert!(report.dry_run);
        assert_eq!(report.pages_total, 2);
        assert_eq!(report.pages_targeted.len(), 2);
        assert!(report.pages_cleared.is_empty());
    }
}
