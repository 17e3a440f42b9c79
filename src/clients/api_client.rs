/// 后端 API 客户端
///
/// 封装 HTTP 传输细节：拼接地址、检查状态码、解析 JSON。
/// 不认识批次或关键词组，只返回 [`ApiError`]，由业务服务决定归类。
use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::utils::truncate_text;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 后端 API 客户端
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET 并解析 JSON
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let response = self.send(endpoint, self.http.get(self.url(endpoint))).await?;
        Self::read_json(endpoint, response).await
    }

    /// GET 原始文本
    pub async fn get_text(&self, endpoint: &str) -> Result<String, ApiError> {
        let response = self.send(endpoint, self.http.get(self.url(endpoint))).await?;
        Self::read_text(endpoint, response).await
    }

    /// POST JSON 请求体
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if let Ok(payload) = serde_json::to_string(body) {
            debug!("POST {} Payload: {}", endpoint, payload);
        }
        let request = self.http.post(self.url(endpoint)).json(body);
        let response = self.send(endpoint, request).await?;
        Self::read_json(endpoint, response).await
    }

    /// POST 空请求体
    pub async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let request = self
            .http
            .post(self.url(endpoint))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let response = self.send(endpoint, request).await?;
        Self::read_json(endpoint, response).await
    }

    /// POST multipart 表单
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(endpoint)).multipart(form);
        let response = self.send(endpoint, request).await?;
        Self::read_json(endpoint, response).await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// 发送请求并检查状态码
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        debug!("请求接口: {}", endpoint);

        let response = request.send().await.map_err(|source| ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("接口 {} 返回 HTTP {}: {}", endpoint, status.as_u16(), body);

        Err(ApiError::BadStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            detail: extract_detail(&body),
        })
    }

    async fn read_text(endpoint: &str, response: Response) -> Result<String, ApiError> {
        response.text().await.map_err(|source| ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn read_json<T: DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> Result<T, ApiError> {
        let body = Self::read_text(endpoint, response).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// 从错误响应中提取说明
///
/// 优先使用 `{"detail": ...}` 字段，否则截断原始文本。
fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value.get("detail") {
            Some(Value::String(detail)) => return Some(detail.clone()),
            Some(other) => return Some(other.to_string()),
            None => {}
        }
    }

    Some(truncate_text(trimmed, 200))
}
