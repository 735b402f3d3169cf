use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// 給使用者看的完整輸出路徑
    fn display_path(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> Option<&str>;
    fn graphql_url(&self) -> Option<&str>;
    fn admin_url(&self) -> &str;
    fn username(&self) -> Option<&str>;
    fn api_token(&self) -> Option<&str>;
    fn admin_token(&self) -> Option<&str>;
    fn org_id(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn page_limit(&self) -> usize;
    fn timeout_seconds(&self) -> u64;
    fn excluded_space_names(&self) -> &[String];
    fn include_personal_spaces(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Report: Serialize + Send + Sync;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Report>;
    async fn load(&self, report: Self::Report) -> Result<String>;
}
