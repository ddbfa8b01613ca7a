//! CLOB HTTP Client - Rate-limited REST API Client
//!
//! Wraps reqwest with retries, a mutation rate limiter and L2 authentication
//! for all Polymarket CLOB REST API interactions.
//!
//! Reads are idempotent and retried with exponential backoff on 429, 5xx
//! and transport failures. Mutations (place/cancel) pass the rate limiter
//! and are sent exactly once: a retried place could double-post.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{ApiConfig, RateLimitConfig};

use super::auth::ClobAuth;

/// Failure of a single CLOB API call.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("request timed out")]
  Timeout,
  #[error("API error {status}: {body}")]
  Status { status: StatusCode, body: String },
  #[error("transport error: {0}")]
  Transport(#[source] reqwest::Error),
  #[error("failed to decode response: {0}")]
  Decode(String),
  #[error("client misconfigured: {0}")]
  Config(String),
}

impl ApiError {
  /// Whether a read may be retried after this error.
  pub fn is_retryable(&self) -> bool {
    match self {
      Self::Timeout | Self::Transport(_) => true,
      Self::Status { status, .. } => {
        *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
      }
      Self::Decode(_) | Self::Config(_) => false,
    }
  }

  /// A 4xx other than 429: the exchange understood and refused the request.
  pub fn is_client_rejection(&self) -> bool {
    matches!(self, Self::Status { status, .. }
      if status.is_client_error() && *status != StatusCode::TOO_MANY_REQUESTS)
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      Self::Timeout
    } else {
      Self::Transport(e)
    }
  }
}

/// Configuration for the CLOB HTTP client.
#[derive(Debug, Clone)]
pub struct ClobClientConfig {
  /// Base URL for the CLOB API.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum retries on transient read errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Place/cancel budget.
  pub max_orders_per_minute: u32,
}

impl ClobClientConfig {
  pub fn from_config(api: &ApiConfig, limits: &RateLimitConfig) -> Self {
    Self {
      base_url: api.clob_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_secs(api.timeout_seconds),
      max_retries: 3,
      retry_base_delay: Duration::from_millis(limits.min_interval_ms),
      max_orders_per_minute: limits.max_orders_per_minute,
    }
  }
}

impl Default for ClobClientConfig {
  fn default() -> Self {
    Self {
      base_url: "https://clob.polymarket.com".to_string(),
      timeout: Duration::from_secs(30),
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
      max_orders_per_minute: 50,
    }
  }
}

/// HTTP client for the Polymarket CLOB API.
///
/// `auth` is optional so read-only tooling (market ranking) can run
/// without API credentials; authenticated calls fail with
/// [`ApiError::Config`] when it is absent.
pub struct ClobClient {
  http: Client,
  auth: Option<Arc<ClobAuth>>,
  config: ClobClientConfig,
  limiter: DefaultDirectRateLimiter,
}

impl ClobClient {
  pub fn new(auth: Option<Arc<ClobAuth>>, config: ClobClientConfig) -> Result<Self, ApiError> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .map_err(|e| ApiError::Config(e.to_string()))?;

    let per_minute = NonZeroU32::new(config.max_orders_per_minute).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_minute(per_minute));

    Ok(Self {
      http,
      auth,
      config,
      limiter,
    })
  }

  pub fn auth(&self) -> Option<&ClobAuth> {
    self.auth.as_deref()
  }

  /// Unauthenticated GET, retried on transient failures.
  pub async fn get_public<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
  ) -> Result<T, ApiError> {
    self.get_with_retry(path, query, false).await
  }

  /// L2-authenticated GET, retried on transient failures.
  pub async fn get_private<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
  ) -> Result<T, ApiError> {
    self.get_with_retry(path, query, true).await
  }

  /// Authenticated POST. Rate limited, never retried.
  pub async fn post<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    self.mutate(Method::POST, path, body).await
  }

  /// Authenticated DELETE. Rate limited, never retried.
  pub async fn delete<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    self.mutate(Method::DELETE, path, body).await
  }

  async fn get_with_retry<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
    authenticated: bool,
  ) -> Result<T, ApiError> {
    let mut attempt = 0;
    loop {
      let mut request = self.http.get(self.url(path)).query(query);
      if authenticated {
        // Fresh timestamp per attempt.
        request = self.sign(request, Method::GET, path, "")?;
      }

      match self.send(request).await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
          let delay = self.config.retry_base_delay * 2u32.pow(attempt);
          attempt += 1;
          warn!(path, attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying request");
          sleep(delay).await;
        }
        Err(e) => return Err(e),
      }
    }
  }

  async fn mutate<B: Serialize, T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let body = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    self.limiter.until_ready().await;

    let request = self
      .http
      .request(method.clone(), self.url(path))
      .header("Content-Type", "application/json")
      .body(body.clone());
    let request = self.sign(request, method, path, &body)?;
    self.send(request).await
  }

  fn sign(
    &self,
    request: RequestBuilder,
    method: Method,
    path: &str,
    body: &str,
  ) -> Result<RequestBuilder, ApiError> {
    let auth = self
      .auth
      .as_ref()
      .ok_or_else(|| ApiError::Config("API credentials required".to_string()))?;
    let headers = auth.headers(method.as_str(), path, body);
    Ok(
      headers
        .pairs()
        .into_iter()
        .fold(request, |req, (name, value)| req.header(name, value)),
    )
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
      return Err(ApiError::Status { status, body: text });
    }

    debug!(status = %status, bytes = text.len(), "CLOB response");
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{e}: {}", snippet(&text))))
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url, path)
  }
}

fn snippet(text: &str) -> &str {
  let end = text
    .char_indices()
    .nth(200)
    .map_or(text.len(), |(idx, _)| idx);
  &text[..end]
}
