use crate::adapters::http::ConfluenceClient;
use crate::app::jobs::{admin_client, required};
use crate::core::aggregate::summarize_accounts;
use crate::core::pagination::{fetch_all, AdminPage};
use crate::core::snapshot::write_snapshot;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ManagedAccount, UserUsageReport};
use crate::utils::error::Result;
use chrono::{Local, NaiveDate};

pub const USER_USAGE_FILE: &str = "confluence_managed_accounts.json";

/// 組織內受管帳號的活躍度統計
pub struct UserUsagePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: ConfluenceClient,
    today: NaiveDate,
}

impl<S: Storage, C: ConfigProvider> UserUsagePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = admin_client(&config)?;
        Ok(Self {
            storage,
            config,
            client,
            today: Local::now().date_naive(),
        })
    }

    /// 固定「今天」，讓活躍期間的計算可重現
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn users_url(&self) -> Result<String> {
        let org_id = required("org_id", self.config.org_id())?;
        Ok(format!(
            "{}/admin/v1/orgs/{}/users",
            self.config.admin_url().trim_end_matches('/'),
            org_id
        ))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for UserUsagePipeline<S, C> {
    type Extracted = Vec<ManagedAccount>;
    type Report = UserUsageReport;

    fn name(&self) -> &str {
        "user-usage"
    }

    async fn extract(&self) -> Result<Vec<ManagedAccount>> {
        let url = self.users_url()?;
        let accounts = fetch_all::<AdminPage<ManagedAccount>>(&self.client, &url, &[]).await?;
        tracing::info!("Retrieved {} managed accounts", accounts.len());
        Ok(accounts)
    }

    async fn transform(&self, data: Vec<ManagedAccount>) -> Result<UserUsageReport> {
        let report = summarize_accounts(data, self.today);
        tracing::info!(
            "Active users: {}, Confluence users: {}, active in last 30/60/90 days: {}/{}/{}",
            report.active_users,
            report.confluence_users_count,
            report.active_in_last_month,
            report.active_in_last_2_months,
            report.active_in_last_3_months
        );
        Ok(report)
    }

    async fn load(&self, report: UserUsageReport) -> Result<String> {
        write_snapshot(&self.storage, USER_USAGE_FILE, &report).await
    }
}
