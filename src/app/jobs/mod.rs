pub mod permissions;
pub mod remove_restrictions;
pub mod spaces;
pub mod user_usage;
pub mod watchers;

pub use permissions::PermissionsPipeline;
pub use remove_restrictions::RemoveRestrictionsPipeline;
pub use spaces::SpacesPipeline;
pub use user_usage::UserUsagePipeline;
pub use watchers::WatchersPipeline;

use crate::adapters::http::{Auth, ConfluenceClient};
use crate::core::pagination::{fetch_all, fetch_all_optional, RestPage};
use crate::core::ConfigProvider;
use crate::domain::model::{Page, Space};
use crate::utils::error::{EtlError, Result};
use std::time::Duration;
use url::Url;

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    value.ok_or_else(|| EtlError::MissingConfigError {
        field: field.to_string(),
    })
}

fn timeout<C: ConfigProvider>(config: &C) -> Duration {
    Duration::from_secs(config.timeout_seconds())
}

/// wiki REST / GraphQL 用的 Basic auth client
pub(crate) fn wiki_client<C: ConfigProvider>(config: &C) -> Result<ConfluenceClient> {
    let auth = Auth::Basic {
        username: required("username", config.username())?.to_string(),
        token: required("api_token", config.api_token())?.to_string(),
    };
    ConfluenceClient::new(auth, timeout(config))
}

/// 組織管理 API 用的 Bearer client
pub(crate) fn admin_client<C: ConfigProvider>(config: &C) -> Result<ConfluenceClient> {
    let token = required("admin_token", config.admin_token())?;
    ConfluenceClient::new(Auth::Bearer(token.to_string()), timeout(config))
}

pub(crate) fn wiki_base_url<C: ConfigProvider>(config: &C) -> Result<String> {
    Ok(required("base_url", config.base_url())?
        .trim_end_matches('/')
        .to_string())
}

/// 未指定時由 base URL 的 origin 推導：`https://site/wiki` -> `https://site/cgraphql`
pub(crate) fn graphql_endpoint<C: ConfigProvider>(config: &C) -> Result<String> {
    if let Some(url) = config.graphql_url() {
        return Ok(url.to_string());
    }
    let mut endpoint = Url::parse(&wiki_base_url(config)?)?;
    endpoint.set_path("/cgraphql");
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    Ok(endpoint.to_string())
}

pub(crate) async fn list_spaces(
    client: &ConfluenceClient,
    base_url: &str,
    page_limit: usize,
) -> Result<Vec<Space>> {
    let spaces = fetch_all::<RestPage<Space>>(
        client,
        &format!("{}/rest/api/space", base_url),
        &[("limit", page_limit.to_string())],
    )
    .await?;
    tracing::info!("Found {} spaces", spaces.len());
    Ok(spaces)
}

fn space_pages_url(base_url: &str, space_key: &str) -> String {
    format!("{}/rest/api/space/{}/content/page", base_url, space_key)
}

pub(crate) async fn list_space_pages(
    client: &ConfluenceClient,
    base_url: &str,
    space_key: &str,
    page_limit: usize,
) -> Result<Vec<Page>> {
    fetch_all::<RestPage<Page>>(
        client,
        &space_pages_url(base_url, space_key),
        &[("limit", page_limit.to_string())],
    )
    .await
}

/// 空間頁面清單；404 回傳 `None`
pub(crate) async fn list_space_pages_optional(
    client: &ConfluenceClient,
    base_url: &str,
    space_key: &str,
    page_limit: usize,
) -> Result<Option<Vec<Page>>> {
    fetch_all_optional::<RestPage<Page>>(
        client,
        &space_pages_url(base_url, space_key),
        &[("limit", page_limit.to_string())],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_graphql_endpoint_derived_from_site_origin() {
        let settings = Settings {
            base_url: Some("https://example.atlassian.net/wiki/".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            graphql_endpoint(&settings).unwrap(),
            "https://example.atlassian.net/cgraphql"
        );
        assert_eq!(
            wiki_base_url(&settings).unwrap(),
            "https://example.atlassian.net/wiki"
        );
    }

    #[test]
    fn test_explicit_graphql_endpoint_wins() {
        let settings = Settings {
            base_url: Some("https://example.atlassian.net/wiki".to_string()),
            graphql_url: Some("http://localhost:9000/graphql".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            graphql_endpoint(&settings).unwrap(),
            "http://localhost:9000/graphql"
        );
    }

    #[test]
    fn test_clients_require_credentials() {
        let settings = Settings::default();
        assert!(matches!(
            wiki_client(&settings),
            Err(EtlError::MissingConfigError { field }) if field == "username"
        ));
        assert!(matches!(
            admin_client(&settings),
            Err(EtlError::MissingConfigError { field }) if field == "admin_token"
        ));
    }
}
