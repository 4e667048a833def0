//! HTTP client for network-based API calls

use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::ApiResponse;

/// Header carrying the idempotency key of a mutating request
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client trait
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> ClientResult<T>;
    async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        idempotency_key: Option<&str>,
    ) -> ClientResult<T>;
}

/// Network HTTP client
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl NetworkHttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn decorate(&self, mut req: RequestBuilder, idempotency_key: Option<&str>) -> RequestBuilder {
        if let Some(token) = &self.token {
            req = req.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_HEADER, key);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            // Prefer the structured error envelope when the backend sends one
            if let Ok(api_err) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                && let Some(code) = api_err.code.filter(|c| *c != 0)
            {
                return Err(ClientError::Api {
                    code,
                    message: api_err.message,
                    details: api_err
                        .details
                        .map(|d| serde_json::Value::Object(d.into_iter().collect())),
                });
            }
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(text)),
            };
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.decorate(self.client.get(self.url(path)), None);
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> ClientResult<T> {
        let req = self.decorate(self.client.post(self.url(path)).json(body), idempotency_key);
        let response = req.send().await?;
        Self::handle_response(response).await
    }

    async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        idempotency_key: Option<&str>,
    ) -> ClientResult<T> {
        let req = self.decorate(self.client.post(self.url(path)), idempotency_key);
        let response = req.send().await?;
        Self::handle_response(response).await
    }
}

/// Unwrap the `data` of a backend envelope, turning error codes into [`ClientError::Api`]
pub fn into_data<T>(response: ApiResponse<T>) -> ClientResult<T> {
    if !response.is_success() {
        return Err(ClientError::Api {
            code: response.code.unwrap_or(1),
            message: response.message,
            details: response
                .details
                .map(|d| serde_json::Value::Object(d.into_iter().collect())),
        });
    }
    response
        .data
        .ok_or_else(|| ClientError::InvalidResponse("Missing response data".into()))
}
