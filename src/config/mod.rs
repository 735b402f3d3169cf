#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_range, validate_required_field, validate_url, Validate,
};
use std::fmt;
use toml_config::TomlConfig;

pub const DEFAULT_ADMIN_URL: &str = "https://api.atlassian.com";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 250;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_EXCLUDED_SPACE: &str = "Cloud Acceleration Service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    UserUsage,
    Spaces,
    Permissions,
    Watchers,
    RemoveRestrictions,
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::UserUsage => "user-usage",
            JobKind::Spaces => "spaces",
            JobKind::Permissions => "permissions",
            JobKind::Watchers => "watchers",
            JobKind::RemoveRestrictions => "remove-restrictions",
        }
    }

    /// 使用組織管理 API（Bearer token）而非 wiki API
    pub fn uses_admin_api(&self) -> bool {
        matches!(self, JobKind::UserUsage)
    }
}

/// 合併 CLI、環境變數、TOML 與預設值後的最終設定
#[derive(Clone)]
pub struct Settings {
    pub base_url: Option<String>,
    pub graphql_url: Option<String>,
    pub admin_url: String,
    pub username: Option<String>,
    pub api_token: Option<String>,
    pub admin_token: Option<String>,
    pub org_id: Option<String>,
    pub output_path: String,
    pub page_limit: usize,
    pub timeout_seconds: u64,
    pub excluded_space_names: Vec<String>,
    pub include_personal_spaces: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            graphql_url: None,
            admin_url: DEFAULT_ADMIN_URL.to_string(),
            username: None,
            api_token: None,
            admin_token: None,
            org_id: None,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            excluded_space_names: vec![DEFAULT_EXCLUDED_SPACE.to_string()],
            include_personal_spaces: false,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "***");
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("graphql_url", &self.graphql_url)
            .field("admin_url", &self.admin_url)
            .field("username", &self.username)
            .field("api_token", &redact(&self.api_token))
            .field("admin_token", &redact(&self.admin_token))
            .field("org_id", &self.org_id)
            .field("output_path", &self.output_path)
            .field("page_limit", &self.page_limit)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("excluded_space_names", &self.excluded_space_names)
            .field("include_personal_spaces", &self.include_personal_spaces)
            .finish()
    }
}

impl Settings {
    /// 以 TOML 檔內容覆蓋預設值
    pub fn from_toml(config: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config.site.base_url.clone(),
            graphql_url: config.site.graphql_url.clone(),
            admin_url: config.admin.url.clone().unwrap_or(defaults.admin_url),
            username: config.auth.username.clone(),
            api_token: config.auth.api_token.clone(),
            admin_token: config.admin.token.clone(),
            org_id: config.admin.org_id.clone(),
            output_path: config.output.path.clone().unwrap_or(defaults.output_path),
            page_limit: config.fetch.page_limit.unwrap_or(defaults.page_limit),
            timeout_seconds: config
                .fetch
                .timeout_seconds
                .unwrap_or(defaults.timeout_seconds),
            excluded_space_names: config
                .permissions
                .excluded_space_names
                .clone()
                .unwrap_or(defaults.excluded_space_names),
            include_personal_spaces: config
                .permissions
                .include_personal_spaces
                .unwrap_or(defaults.include_personal_spaces),
        }
    }

    /// 通用檢查之外，再確認該工作需要的憑證都已提供
    pub fn validate_for(&self, job: JobKind) -> Result<()> {
        self.validate()?;

        if job.uses_admin_api() {
            validate_required_field("admin_token", &self.admin_token)?;
            validate_required_field("org_id", &self.org_id)?;
        } else {
            let base_url = validate_required_field("base_url", &self.base_url)?;
            validate_url("base_url", base_url)?;
            validate_required_field("username", &self.username)?;
            validate_required_field("api_token", &self.api_token)?;
        }
        Ok(())
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validate_url("base_url", base_url)?;
        }
        if let Some(graphql_url) = &self.graphql_url {
            validate_url("graphql_url", graphql_url)?;
        }
        validate_url("admin_url", &self.admin_url)?;
        validate_path("output_path", &self.output_path)?;
        validate_range("page_limit", self.page_limit, 1, MAX_PAGE_LIMIT)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 3600)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn graphql_url(&self) -> Option<&str> {
        self.graphql_url.as_deref()
    }

    fn admin_url(&self) -> &str {
        &self.admin_url
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn page_limit(&self) -> usize {
        self.page_limit
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn excluded_space_names(&self) -> &[String] {
        &self.excluded_space_names
    }

    fn include_personal_spaces(&self) -> bool {
        self.include_personal_spaces
    }
}
