use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// 平台回傳的 ID 可能是數字（v1 space）或字串（page）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{}", n),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId::Text(value.to_string())
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        ResourceId::Number(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAccess {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 組織管理 API 的帳號記錄；未使用的欄位原樣保留
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedAccount {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account_status: String,
    #[serde(default)]
    pub last_active: Option<String>,
    #[serde(default)]
    pub product_access: Vec<ProductAccess>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManagedAccount {
    pub fn is_active(&self) -> bool {
        self.account_status == "active"
    }

    pub fn has_product(&self, product: &str) -> bool {
        self.product_access
            .iter()
            .any(|access| access.name.as_deref() == Some(product))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: ResourceId,
    pub key: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub space_type: String,
}

impl Space {
    pub fn is_personal(&self) -> bool {
        self.space_type == "personal"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: ResourceId,
    #[serde(default)]
    pub title: String,
}

pub type DomainCounts = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub name: Option<String>,
    pub email: String,
}

/// 單一活躍期間的統計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSummary {
    pub days: u32,
    pub domain_counts: DomainCounts,
    pub users: Vec<UserRef>,
}

impl WindowSummary {
    pub fn total(&self) -> usize {
        self.users.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserUsageReport {
    pub active_users: usize,
    pub confluence_users_count: u64,
    pub active_in_last_3_months: usize,
    pub active_in_last_2_months: usize,
    pub active_in_last_month: usize,
    pub confluence_domain_counts: DomainCounts,
    pub active_in_last_3_months_domain_counts: DomainCounts,
    pub active_in_last_2_months_domain_counts: DomainCounts,
    pub active_in_last_month_domain_counts: DomainCounts,
    pub users_in_last_3_months: Vec<UserRef>,
    pub users_in_last_2_months: Vec<UserRef>,
    pub users_in_last_month: Vec<UserRef>,
    pub accounts: Vec<ManagedAccount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceSummary {
    pub space_name: String,
    pub space_id: ResourceId,
    pub space_key: String,
    pub space_type: String,
}

impl From<&Space> for SpaceSummary {
    fn from(space: &Space) -> Self {
        Self {
            space_name: space.name.clone(),
            space_id: space.id.clone(),
            space_key: space.key.clone(),
            space_type: space.space_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceInventory {
    pub total_spaces: usize,
    pub spaces: Vec<SpaceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageRestrictions {
    pub page_name: String,
    pub page_id: ResourceId,
    pub page_restrictions: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceAccessReport {
    pub space_name: String,
    pub space_id: ResourceId,
    pub space_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_permissions: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_pages: Option<Vec<PageRestrictions>>,
}

impl SpaceAccessReport {
    pub fn header_only(space: &Space) -> Self {
        Self {
            space_name: space.name.clone(),
            space_id: space.id.clone(),
            space_type: space.space_type.clone(),
            space_permissions: None,
            space_pages: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatcherList {
    pub count: u64,
    pub watchers: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageWatchers {
    pub page_name: String,
    pub page_id: ResourceId,
    pub page_watchers: WatcherList,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceWatchersReport {
    pub space_name: String,
    pub space_id: ResourceId,
    pub space_type: String,
    pub space_watchers: WatcherList,
    pub space_pages: Vec<PageWatchers>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestrictionRemovalReport {
    pub space_key: String,
    pub dry_run: bool,
    pub pages_total: usize,
    pub pages_targeted: Vec<ResourceId>,
    /// dry run 時為空
    pub pages_cleared: Vec<ResourceId>,
}
