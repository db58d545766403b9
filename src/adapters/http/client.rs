use crate::ports::{ApiError, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// ライブラリAPIのHTTPクライアント
///
/// すべてのポートをこの1つの型で実装する（リソースごとの実装は隣接モジュール）。
/// 各操作は1回のHTTPリクエストのみを発行し、再試行もキャッシュもしない。
///
/// ログイン・登録で得たトークンを保持し、以降のすべてのリクエストに
/// `Authorization: Bearer` ヘッダーとして付与する。
#[derive(Clone)]
pub struct HttpLibraryApi {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpLibraryApi {
    /// クライアントを作成する
    ///
    /// # 引数
    /// * `base_url` - APIのオリジン（例: `http://localhost:8000`）
    /// * `timeout` - リクエストのタイムアウト。`None` なら無制限
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(super) fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "API request");

        let request = self.client.request(method, url);
        match self.token.read().ok().and_then(|t| t.clone()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(super) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    pub(super) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = send(self.request(Method::POST, path).json(body)).await?;
        decode(response).await
    }

    /// ボディなしのPOST（/borrowed/return/{id}, /messages/read/{id}）
    pub(super) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = send(self.request(Method::POST, path)).await?;
        decode(response).await
    }

    /// POSTして応答本文は捨てる
    pub(super) async fn post_discard<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        send(self.request(Method::POST, path).json(body)).await?;
        Ok(())
    }

    pub(super) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = send(self.request(Method::PUT, path).json(body)).await?;
        decode(response).await
    }

    /// ボディなしのPUT（/reviews/{id}/like など）
    pub(super) async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = send(self.request(Method::PUT, path)).await?;
        decode(response).await
    }

    pub(super) async fn delete(&self, path: &str) -> Result<()> {
        send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

/// リクエストを送信し、成功以外のステータスを `ApiError::Status` に変換する
async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|e| {
        warn!(error = %e, "API request failed");
        ApiError::Transport(e.to_string())
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(status = status.as_u16(), %message, "API returned error status");
    Err(ApiError::status(status.as_u16(), message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// エラー本文からメッセージを取り出す
///
/// `{detail}`、`{message}`、`{error}` の順に探し、なければステータスの標準的な理由句。
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        })
}
