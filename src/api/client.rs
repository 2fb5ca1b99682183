use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use super::CacheStore;

const USER_AGENT: &str = "moodlift/0.2 (https://github.com/moodlift/moodlift)";

/// A fetched response body: JSON when the body parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Json(serde_json::Value),
    Text(String),
}

impl Fetched {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Fetched::Json(v) => Some(v),
            Fetched::Text(_) => None,
        }
    }

    // Cache entries carry a kind tag so a JSON body whose top level is a
    // string comes back as Json, not Text
    fn into_cache_entry(self) -> serde_json::Value {
        match self {
            Fetched::Json(v) => serde_json::json!({"kind": "json", "body": v}),
            Fetched::Text(t) => serde_json::json!({"kind": "text", "body": t}),
        }
    }

    fn from_cache_entry(value: serde_json::Value) -> Option<Self> {
        let body = value.get("body")?.clone();
        match value.get("kind")?.as_str()? {
            "json" => Some(Fetched::Json(body)),
            "text" => Some(Fetched::Text(body.as_str()?.to_string())),
            _ => None,
        }
    }
}

/// Why a fetch failed. Callers treat every variant as "source unavailable";
/// the split exists for logging and tests.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Bounded retry with exponential backoff. Only transient failures are
/// retried; a 404 fails immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // Fail fast: a hook cannot afford long retry chains
        Self {
            max_retries: 1,
            initial_backoff_ms: 300,
            max_backoff_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn is_transient(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }
        let base = self.initial_backoff_ms as f64 * self.multiplier.powi(attempt as i32 - 1);
        Duration::from_millis(base.min(self.max_backoff_ms as f64) as u64)
    }
}

/// HTTP client with per-client timeout, retry policy, and read-through TTL
/// caching keyed on (url, params).
pub struct ApiClient {
    base_url: Option<String>,
    http: reqwest::Client,
    retry: RetryPolicy,
    cache: Mutex<CacheStore>,
    cache_ttl: chrono::Duration,
}

impl ApiClient {
    pub fn new(
        base_url: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
        cache: CacheStore,
        cache_ttl: chrono::Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url,
            http,
            retry,
            cache: Mutex::new(cache),
            cache_ttl,
        })
    }

    /// Join relative paths onto the base URL; absolute URLs pass through.
    fn full_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/')),
            None => url.to_string(),
        }
    }

    fn cache_get(&self, key: &str) -> Option<serde_json::Value> {
        self.cache.lock().ok()?.get(key)
    }

    fn cache_put(&self, key: &str, value: serde_json::Value) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, value, self.cache_ttl);
        }
    }

    /// GET with caching and bounded retries. Any `Err` means the source is
    /// unavailable right now; callers never propagate it further up.
    pub async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(&str, &str)],
        use_cache: bool,
    ) -> Result<Fetched, FetchError> {
        let full_url = self.full_url(url);
        let key = CacheStore::cache_key(&full_url, params);

        if use_cache {
            // An unreadable entry falls through to a live fetch
            if let Some(fetched) = self.cache_get(&key).and_then(Fetched::from_cache_entry) {
                return Ok(fetched);
            }
        }

        let fetched = self
            .request(|| {
                let mut req = self.http.get(&full_url);
                if !params.is_empty() {
                    req = req.query(params);
                }
                for (name, value) in headers {
                    req = req.header(*name, *value);
                }
                req
            })
            .await?;

        if use_cache {
            self.cache_put(&key, fetched.clone().into_cache_entry());
        }
        Ok(fetched)
    }

    /// POST a JSON body. Responses are never cached.
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<Fetched, FetchError> {
        let full_url = self.full_url(url);
        self.request(|| self.http.post(&full_url).json(body)).await
    }

    async fn request<F>(&self, build: F) -> Result<Fetched, FetchError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() {
                        let text = resp
                            .text()
                            .await
                            .map_err(|e| FetchError::Body(e.to_string()))?;
                        return Ok(match serde_json::from_str::<serde_json::Value>(&text) {
                            Ok(v) => Fetched::Json(v),
                            Err(_) => Fetched::Text(text),
                        });
                    }
                    if RetryPolicy::is_transient(status) && attempt <= self.retry.max_retries {
                        let wait = self.retry.backoff(attempt);
                        tracing::warn!(status, attempt, wait_ms = wait.as_millis() as u64, "transient HTTP error, retrying");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(FetchError::Status(status));
                }
                Err(e) => {
                    if attempt <= self.retry.max_retries {
                        let wait = self.retry.backoff(attempt);
                        tracing::warn!(error = %e, attempt, "request failed, retrying");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(if e.is_timeout() {
                        FetchError::Timeout
                    } else {
                        FetchError::Connect(e.to_string())
                    });
                }
            }
        }
    }
}
