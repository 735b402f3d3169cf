use crate::utils::error::{EtlError, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const USER_AGENT: &str = concat!("confluence-snapshot/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 512;

/// 認證方式：wiki API 用 Basic（帳號 + API token），組織管理 API 用 Bearer
#[derive(Clone)]
pub enum Auth {
    Basic { username: String, token: String },
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("token", &"***")
                .finish(),
            Auth::Bearer(_) => f.debug_tuple("Bearer").field(&"***").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    client: Client,
    auth: Auth,
}

impl ConfluenceClient {
    pub fn new(auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, auth })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.auth {
            Auth::Basic { username, token } => request.basic_auth(username, Some(token)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        tracing::debug!("{} <- {}", response.status(), url);
        Ok(response)
    }

    /// 非 2xx 一律視為錯誤，保留截短後的回應內容方便除錯
    async fn ensure_success(response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(EtlError::HttpStatusError {
            status: status.as_u16(),
            url: url.to_string(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }

    /// 選用的子資源：404 回傳 `None`，其餘非 2xx 仍為錯誤
    async fn optional(response: Response, url: &str) -> Result<Option<Response>> {
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("Optional resource not found (404): {}", url);
            return Ok(None);
        }
        Ok(Some(Self::ensure_success(response, url).await?))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url).query(query), url).await?;
        let response = Self::ensure_success(response, url).await?;
        Self::decode(response).await
    }

    pub async fn get_json_optional<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url).query(query), url).await?;
        match Self::optional(response, url).await? {
            Some(response) => Ok(Some(Self::decode(response).await?)),
            None => Ok(None),
        }
    }

    pub async fn post_json<B, T>(&self, url: &str, query: &[(&str, String)], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let request = self.client.post(url).query(query).json(body);
        let response = self.send(request, url).await?;
        let response = Self::ensure_success(response, url).await?;
        Self::decode(response).await
    }

    pub async fn post_json_optional<B, T>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<Option<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let request = self.client.post(url).query(query).json(body);
        let response = self.send(request, url).await?;
        match Self::optional(response, url).await? {
            Some(response) => Ok(Some(Self::decode(response).await?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        tracing::debug!("DELETE {}", url);
        let response = self.send(self.client.delete(url), url).await?;
        Self::ensure_success(response, url).await?;
        Ok(())
    }
}
