// src/api/mod.rs

//! Typed calls to the tryout backend.
//!
//! Every authenticated call reads the bearer token from the [`TokenStore`]
//! first; a missing token fails the call before anything is sent.

pub mod attempts;
pub mod catalog;
pub mod pdf;
pub mod profile;
pub mod questions;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Config,
    error::AppError,
    models::{
        attempt::{Attempt, AttemptPatch},
        question::ServerQuestion,
    },
    utils::token::TokenStore,
};

/// Remote store for attempt records: the seam between the synchronizer and
/// the backend. Implemented by [`ApiClient`]; tests provide in-memory doubles.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn start_attempt(&self, tryout_id: &str) -> Result<Attempt, AppError>;

    async fn get_attempt(&self, tryout_id: &str, attempt_number: i64)
    -> Result<Attempt, AppError>;

    async fn list_attempts(&self, tryout_id: &str) -> Result<Vec<Attempt>, AppError>;

    /// Applies a partial update and returns the authoritative record.
    async fn update_attempt(
        &self,
        tryout_id: &str,
        attempt_number: i64,
        patch: &AttemptPatch,
    ) -> Result<Attempt, AppError>;

    async fn list_questions(&self, tryout_id: &str) -> Result<Vec<ServerQuestion>, AppError>;
}

/// HTTP client for the backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: TokenStore, timeout: Duration) -> Result<Self, AppError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(AppError::MissingParameter(format!(
                "'{}' cannot be used as a base url",
                base_url
            )));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base, tokens })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            &config.api_url,
            TokenStore::new(config.token_path.clone()),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Builds `base/<segments...>`, percent-encoding every segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Like [`endpoint`](Self::endpoint) with a `?key=value` query.
    pub(crate) fn endpoint_with_query(&self, segments: &[&str], key: &str, value: &str) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().append_pair(key, value);
        url
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Request carrying the stored bearer token.
    pub(crate) fn authed(&self, method: Method, url: Url) -> Result<RequestBuilder, AppError> {
        let token = self.tokens.require()?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Sends a request and decodes a JSON body from a success response.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, AppError> {
        let res = self.send(req).await?;
        res.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to decode response body: {:?}", e);
            AppError::Decode(e.to_string())
        })
    }

    /// Sends a request and maps non-success statuses to `AppError::Remote`.
    pub(crate) async fn send(&self, req: RequestBuilder) -> Result<Response, AppError> {
        let res = req.send().await.map_err(|e| {
            tracing::error!("Request failed: {:?}", e);
            AppError::from(e)
        })?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        tracing::warn!("Backend responded {}: {}", status, message);

        Err(AppError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

/// Extracts `error` or `message` from a JSON error body, or the raw text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| Some(body.to_string())),
        Err(_) => Some(body.to_string()),
    }
}

/// Rejects blank tryout ids before any request is built.
pub(crate) fn require_tryout_id(tryout_id: &str) -> Result<&str, AppError> {
    let trimmed = tryout_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingParameter("tryoutId".to_string()));
    }
    Ok(trimmed)
}

#[async_trait]
impl AttemptStore for ApiClient {
    async fn start_attempt(&self, tryout_id: &str) -> Result<Attempt, AppError> {
        ApiClient::start_attempt(self, tryout_id).await
    }

    async fn get_attempt(
        &self,
        tryout_id: &str,
        attempt_number: i64,
    ) -> Result<Attempt, AppError> {
        ApiClient::get_attempt(self, tryout_id, attempt_number).await
    }

    async fn list_attempts(&self, tryout_id: &str) -> Result<Vec<Attempt>, AppError> {
        ApiClient::list_attempts(self, tryout_id).await
    }

    async fn update_attempt(
        &self,
        tryout_id: &str,
        attempt_number: i64,
        patch: &AttemptPatch,
    ) -> Result<Attempt, AppError> {
        ApiClient::update_attempt(self, tryout_id, attempt_number, patch).await
    }

    async fn list_questions(&self, tryout_id: &str) -> Result<Vec<ServerQuestion>, AppError> {
        ApiClient::list_questions(self, tryout_id).await
    }
}
