//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured headers and timeouts
//! - GET requests to fetch page content
//! - Retry with exponential backoff for transient failures
//! - Content-Type classification
//! - Binary downloads for linked documents

use crate::config::{CrawlerConfig, HttpConfig};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Content types parsed as HTML
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Declared charset, `utf-8` when none is declared
    pub encoding: String,
    /// Decoded page body
    pub body: String,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Html(FetchedPage),

    /// Response was not HTML (Content-Type mismatch)
    Unsupported {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Page could not be retrieved, retries included
    Unreachable { error: FetchError },
}

/// Classified fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Returns true when retrying the request may succeed
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | HTTP 429 | yes |
    /// | HTTP 5xx | yes |
    /// | Other HTTP status | no |
    /// | Body read / other request errors | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) => true,
            Self::Status(code) => *code == 429 || (500..600).contains(code),
            Self::Body(_) | Self::Request(_) => false,
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use sumi_glean::config::HttpConfig;
/// use sumi_glean::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, crate::GleanError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|e| {
            crate::ConfigError::Validation(format!("Invalid user-agent header: {}", e))
        })?,
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language).map_err(|e| {
            crate::ConfigError::Validation(format!("Invalid accept-language header: {}", e))
        })?,
    );

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Wait applied before every request to the site
///
/// Page fetches, locale variants and document downloads all pay it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoliteDelay {
    base_ms: u64,
    jitter_ms: u64,
}

impl PoliteDelay {
    pub fn new(base_ms: u64, jitter_ms: u64) -> Self {
        Self { base_ms, jitter_ms }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.polite_delay_ms, config.polite_jitter_ms)
    }

    /// Fixed delay plus uniform jitter
    pub fn sample(&self) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.base_ms + jitter)
    }

    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// HTTP client plus the retry policy
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, crate::GleanError> {
        Ok(Self::with_client(build_http_client(config)?, config))
    }

    pub fn with_client(client: Client, config: &HttpConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Fetches a page, classifying the response
    ///
    /// # Request Flow
    ///
    /// 1. Send GET request (redirects followed by the client)
    /// 2. Non-2xx status → `FetchError::Status`
    /// 3. Content-Type not HTML → `Unsupported`
    /// 4. Decode the body with its declared charset
    ///
    /// Transient failures are retried up to `max_retries` times with
    /// `retry_backoff * 2^attempt` between attempts.
    pub async fn fetch_page(&self, url: &Url) -> FetchResult {
        let outcome = self
            .with_retry(url, move || async move {
                let response = self.send(url).await?;
                let content_type = header_content_type(&response);

                if !is_html(&content_type) {
                    return Ok(FetchResult::Unsupported { content_type });
                }

                let final_url = response.url().clone();
                let status_code = response.status().as_u16();
                let encoding = charset(&content_type).unwrap_or_else(|| "utf-8".to_string());
                let body = response.text().await.map_err(FetchError::from_reqwest)?;

                Ok(FetchResult::Html(FetchedPage {
                    final_url,
                    status_code,
                    content_type,
                    encoding,
                    body,
                }))
            })
            .await;

        outcome.unwrap_or_else(|error| FetchResult::Unreachable { error })
    }

    /// Downloads a binary body with the same retry policy as pages
    pub async fn fetch_document(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.with_retry(url, move || async move {
            let response = self.send(url).await?;
            let bytes = response.bytes().await.map_err(FetchError::from_reqwest)?;
            Ok(bytes.to_vec())
        })
        .await
    }

    async fn send(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn with_retry<T, F, Fut>(&self, url: &Url, mut attempt: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && retries < self.max_retries => {
                    let delay = backoff_delay(self.retry_backoff, retries);
                    tracing::debug!(
                        "Retrying {} in {:?} after {} (attempt {}/{})",
                        url,
                        delay,
                        error,
                        retries + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Delay before retry number `retry` (zero-based)
fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
}

fn header_content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Checks the MIME essence of a Content-Type header against the HTML types
fn is_html(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_CONTENT_TYPES.contains(&essence.as_str())
}

/// Extracts the `charset` parameter of a Content-Type header
fn charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_ascii_lowercase())
        } else {
            None
        }
    })
}
