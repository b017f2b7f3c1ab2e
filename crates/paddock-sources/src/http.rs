//! Shared HTTP plumbing for the upstream clients
//!
//! # Features
//!
//! - Retry with exponential backoff on transport errors, 429 and 5xx
//! - Optional request pacing through a `governor` rate limiter
//! - Optional on-disk response cache keyed by the SHA-256 of the URL

use crate::config::SourcesConfig;
use crate::SourceError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// On-disk cache of raw response bodies
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl ResponseCache {
    /// Create a cache rooted at `dir`; entries older than `ttl` are ignored
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{:x}.json", digest))
    }

    /// Cached body for a URL, if present and fresh
    pub async fn get(&self, url: &str) -> Option<String> {
        let path = self.path_for(url);
        let metadata = tokio::fs::metadata(&path).await.ok()?;

        if let Some(ttl) = self.ttl {
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok())
                .unwrap_or(Duration::MAX);
            if age > ttl {
                return None;
            }
        }

        tokio::fs::read_to_string(&path).await.ok()
    }

    /// Store a body for a URL
    pub async fn put(&self, url: &str, body: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(url);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await
    }
}

/// HTTP GET client with retries, pacing and caching
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay: Duration,
    cache: Option<ResponseCache>,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl HttpFetcher {
    /// Build a fetcher from the shared sources configuration
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("paddock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Communication(format!("Failed to build client: {}", e)))?;

        let cache = config
            .response_cache_dir
            .as_ref()
            .map(|dir| ResponseCache::new(dir.clone(), config.response_cache_ttl()));

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay(),
            cache,
            rate_limiter: None,
        })
    }

    /// Pace outgoing requests; zero disables pacing
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limiter = NonZeroU32::new(requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));
        self
    }

    /// Set the maximum number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Fetch and decode a JSON document
    ///
    /// A cached body that no longer decodes is ignored and refetched.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await {
                match serde_json::from_str(&body) {
                    Ok(value) => {
                        debug!(url, "response cache hit");
                        return Ok(value);
                    }
                    Err(e) => warn!(url, error = %e, "discarding undecodable cached response"),
                }
            }
        }

        let body = self.get_text(url).await?;
        let value = serde_json::from_str(&body).map_err(|e| {
            SourceError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, &body).await {
                warn!(url, error = %e, "failed to write response cache");
            }
        }

        Ok(value)
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            if let Some(limiter) = &self.rate_limiter {
                limiter.until_ready().await;
            }

            debug!(url, attempt = attempts + 1, "GET");
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| {
                            SourceError::InvalidResponse(format!("Failed to read body: {}", e))
                        });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(SourceError::NotFound(url.to_string()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(SourceError::RateLimitExceeded);
                    } else if status.is_server_error() {
                        last_error = Some(SourceError::Communication(format!(
                            "HTTP {} from {}",
                            status, url
                        )));
                    } else {
                        return Err(SourceError::Communication(format!(
                            "HTTP {} from {}",
                            status, url
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(SourceError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = self.retry_base_delay * 2u32.pow(attempts - 1);
                warn!(url, attempt = attempts, ?delay, "request failed, backing off");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| SourceError::Communication("Max retries exceeded".to_string())))
    }
}
