use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client as ReqwestClient, Proxy, StatusCode};
use url::Url;

use crate::error::{CrawlError, FetchError};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "en-GB,en-US;q=0.8,en;q=0.7",
];

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A fetched page after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: Url,
    pub body: String,
}

/// Page retrieval, with per-request header overrides.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<FetchedPage, FetchError>;
}

/// Browser-like request headers, re-rolled for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderRotation;

impl HeaderRotation {
    pub fn next_headers(&self) -> HeaderMap {
        let mut rng = rand::rng();
        let mut headers = HeaderMap::new();
        if let Some(user_agent) = USER_AGENTS.choose(&mut rng) {
            headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
        }
        if let Some(language) = ACCEPT_LANGUAGES.choose(&mut rng) {
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(language));
        }
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers
    }
}

/// reqwest-backed fetcher; with proxies configured, requests rotate
/// through one client per proxy.
#[derive(Debug)]
pub struct ReqwestFetcher {
    clients: Vec<ReqwestClient>,
    next_client: AtomicUsize,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration, proxies: &[Url]) -> Result<Self, CrawlError> {
        let clients = if proxies.is_empty() {
            vec![Self::builder(timeout).build()?]
        } else {
            proxies
                .iter()
                .map(|proxy| {
                    let proxy = Proxy::all(proxy.as_str())?;
                    Self::builder(timeout).proxy(proxy).build()
                })
                .collect::<Result<Vec<_>, reqwest::Error>>()?
        };
        tracing::debug!("Built {} HTTP client(s)", clients.len());
        Ok(Self {
            clients,
            next_client: AtomicUsize::new(0),
        })
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Duration::from_secs(60))
    }

    fn client(&self) -> &ReqwestClient {
        let index = self.next_client.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[index]
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<FetchedPage, FetchError> {
        let response = self
            .client()
            .get(url.as_str())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transient {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| FetchError::Transient {
            url: url.to_string(),
            reason: format!("Failed to read response text: {}", e),
        })?;
        Ok(FetchedPage { final_url, body })
    }
}

/// 408, 429, 5xx and 403 (usually an anti-bot block) are worth retrying.
pub fn classify_status(url: &Url, status: StatusCode) -> FetchError {
    if status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN
        )
    {
        FetchError::Transient {
            url: url.to_string(),
            reason: format!("status {}", status),
        }
    } else {
        FetchError::Permanent {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }
}
