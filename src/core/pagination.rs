//! Page-following helpers shared by every job.
//!
//! REST endpoints embed a "next" link in each page; GraphQL connections expose
//! `pageInfo { hasNextPage endCursor }`. Both are followed until the server stops
//! handing out a continuation, and items are concatenated in arrival order.

use crate::adapters::http::ConfluenceClient;
use crate::domain::model::WatcherList;
use crate::utils::error::{EtlError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// 單頁結果
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub base: Option<String>,
}

pub trait PageEnvelope: DeserializeOwned {
    type Item;

    fn into_page(self) -> Page<Self::Item>;
}

/// 組織管理 API：`{ "data": [...], "links": { "next": "<absolute url>" } }`
#[derive(Debug, Deserialize)]
pub struct AdminPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub links: Option<AdminLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminLinks {
    pub next: Option<String>,
}

impl<T: DeserializeOwned> PageEnvelope for AdminPage<T> {
    type Item = T;

    fn into_page(self) -> Page<T> {
        Page {
            items: self.data,
            next: self.links.and_then(|links| links.next),
            base: None,
        }
    }
}

/// REST v1/v2：`{ "results": [...], "_links": { "next": "/rest/...", "base": "https://site/wiki" } }`
#[derive(Debug, Deserialize)]
pub struct RestPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(rename = "_links")]
    pub links: Option<RestLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestLinks {
    pub next: Option<String>,
    pub base: Option<String>,
}

impl<T: DeserializeOwned> PageEnvelope for RestPage<T> {
    type Item = T;

    fn into_page(self) -> Page<T> {
        let links = self.links.unwrap_or_default();
        Page {
            items: self.results,
            next: links.next,
            base: links.base,
        }
    }
}

/// 解析下一頁連結：絕對網址直接使用；相對網址優先接在 `_links.base` 之後，
/// 否則相對於目前頁面解析。
///
/// v1 的 next 相對於 base（`/rest/api/...`），v2 的 next 相對於站台根目錄且已含
/// base 的路徑（`/wiki/api/v2/...`），後者改以 base 的 origin 解析
pub fn resolve_next(current: &Url, base: Option<&str>, next: &str) -> Result<Url> {
    if let Ok(absolute) = Url::parse(next) {
        return Ok(absolute);
    }

    match base.filter(|b| !b.is_empty()) {
        Some(base) => {
            let base_url = Url::parse(base)?;
            let base_path = base_url.path().trim_end_matches('/');
            if next.starts_with('/') && includes_base_path(base_path, next) {
                return Ok(base_url.join(next)?);
            }

            let base = base.trim_end_matches('/');
            let joined = if next.starts_with('/') {
                format!("{}{}", base, next)
            } else {
                format!("{}/{}", base, next)
            };
            Ok(Url::parse(&joined)?)
        }
        None => Ok(current.join(next)?),
    }
}

fn includes_base_path(base_path: &str, next: &str) -> bool {
    if base_path.is_empty() {
        return false;
    }
    match next.strip_prefix(base_path) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?']),
        None => false,
    }
}

/// 取回所有分頁，任何非 2xx 回應皆為錯誤
pub async fn fetch_all<E: PageEnvelope>(
    client: &ConfluenceClient,
    start_url: &str,
    query: &[(&str, String)],
) -> Result<Vec<E::Item>> {
    Ok(fetch_pages::<E>(client, start_url, query, false)
        .await?
        .unwrap_or_default())
}

/// 同 [`fetch_all`]，但第一頁 404 時回傳 `None`（選用的子資源）
pub async fn fetch_all_optional<E: PageEnvelope>(
    client: &ConfluenceClient,
    start_url: &str,
    query: &[(&str, String)],
) -> Result<Option<Vec<E::Item>>> {
    fetch_pages::<E>(client, start_url, query, true).await
}

async fn fetch_pages<E: PageEnvelope>(
    client: &ConfluenceClient,
    start_url: &str,
    query: &[(&str, String)],
    tolerate_not_found: bool,
) -> Result<Option<Vec<E::Item>>> {
    let mut current = Url::parse(start_url)?;
    if !query.is_empty() {
        let mut pairs = current.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    let mut items = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(current.to_string());
    let mut page_number = 0usize;

    loop {
        page_number += 1;
        let url = current.to_string();

        let envelope: E = if tolerate_not_found && page_number == 1 {
            match client.get_json_optional(&url, &[]).await? {
                Some(envelope) => envelope,
                None => return Ok(None),
            }
        } else {
            client.get_json(&url, &[]).await?
        };

        let page = envelope.into_page();
        tracing::debug!("Page {} of {}: {} items", page_number, url, page.items.len());
        items.extend(page.items);

        let next = match page.next.filter(|next| !next.is_empty()) {
            Some(next) => next,
            None => break,
        };

        let next_url = resolve_next(&current, page.base.as_deref(), &next)?;
        if !visited.insert(next_url.to_string()) {
            return Err(EtlError::PaginationLoopError {
                url: next_url.to_string(),
            });
        }
        current = next_url;
    }

    Ok(Some(items))
}

/// GraphQL connection 查詢（空間 / 頁面關注者）
pub trait ConnectionQuery: Sync {
    fn operation_name(&self) -> &'static str;
    /// `data` 底下 connection 所在的欄位
    fn root_field(&self) -> &'static str;
    fn document(&self) -> &'static str;
    fn variables(&self, after: Option<&str>) -> Value;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    operation_name: &'a str,
    variables: Value,
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    count: Option<u64>,
    #[serde(default)]
    nodes: Vec<Value>,
    page_info: Option<PageInfo>,
}

/// 依 `endCursor` 逐頁取回 connection 的所有節點；第一頁 404 視為沒有關注者
pub async fn fetch_connection<Q: ConnectionQuery>(
    client: &ConfluenceClient,
    endpoint: &str,
    query: &Q,
) -> Result<WatcherList> {
    let operation = query.operation_name();
    let operation_param = [("q", operation.to_string())];

    let mut watchers = Vec::new();
    let mut reported_count: Option<u64> = None;
    let mut after: Option<String> = None;
    let mut seen_cursors = HashSet::new();

    loop {
        let request = GraphQlRequest {
            operation_name: operation,
            variables: query.variables(after.as_deref()),
            query: query.document(),
        };

        // 只有第一頁的 404 代表「沒有關注者」；之後的 404 會遺失已取得的資料，視為錯誤
        let response: GraphQlResponse = if after.is_none() {
            match client
                .post_json_optional(endpoint, &operation_param, &request)
                .await?
            {
                Some(response) => response,
                None => return Ok(WatcherList::default()),
            }
        } else {
            client
                .post_json(endpoint, &operation_param, &request)
                .await?
        };

        let messages = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        let data = match response.data {
            Some(data) if !data.is_null() => data,
            _ if !messages.is_empty() => {
                return Err(EtlError::GraphQlError {
                    operation: operation.to_string(),
                    message: messages,
                })
            }
            _ => break,
        };
        if !messages.is_empty() {
            tracing::warn!("{} returned partial data: {}", operation, messages);
        }

        let connection = match data.get(query.root_field()) {
            Some(value) if !value.is_null() => Connection::deserialize(value)?,
            _ => break,
        };

        if reported_count.is_none() {
            reported_count = connection.count;
        }
        watchers.extend(connection.nodes);

        match connection.page_info {
            Some(PageInfo {
                has_next_page: true,
                end_cursor: Some(cursor),
            }) => {
                if !seen_cursors.insert(cursor.clone()) {
                    return Err(EtlError::PaginationLoopError {
                        url: format!("{}?q={} (after {})", endpoint, operation, cursor),
                    });
                }
                after = Some(cursor);
            }
            _ => break,
        }
    }

    Ok(WatcherList {
        count: reported_count.unwrap_or(watchers.len() as u64),
        watchers,
    })
}
