use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::CrawlError;

pub const SITE_ORIGIN: &str = "https://www.efinancialcareers.com";

const DEFAULT_RESULTS_WANTED: usize = 100;
const DEFAULT_MAX_PAGES: u32 = 10;

/// Run input, as supplied by the actor platform or an `--input` JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlInput {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub results_wanted: Option<Value>,
    #[serde(default)]
    pub max_pages: Option<Value>,
    #[serde(default, rename = "collectDetails")]
    pub collect_details: Option<bool>,
    #[serde(default, rename = "startUrl")]
    pub start_url: Option<String>,
    #[serde(default, rename = "startUrls")]
    pub start_urls: Vec<SeedUrl>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "proxyConfiguration")]
    pub proxy_configuration: Option<Value>,
}

/// `startUrls` entries may be bare strings or request objects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeedUrl {
    Plain(String),
    Request { url: String },
}

impl SeedUrl {
    pub fn as_str(&self) -> &str {
        match self {
            SeedUrl::Plain(url) | SeedUrl::Request { url } => url,
        }
    }
}

/// Global limits shared by every LIST and DETAIL handler of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBudget {
    pub results_wanted: usize,
    pub max_pages: u32,
    pub collect_details: bool,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            results_wanted: DEFAULT_RESULTS_WANTED,
            max_pages: DEFAULT_MAX_PAGES,
            collect_details: true,
        }
    }
}

impl CrawlInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CrawlError::InputIo {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CrawlError::InputJson {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn budget(&self) -> RunBudget {
        RunBudget {
            results_wanted: coerce_results_wanted(self.results_wanted.as_ref()),
            max_pages: coerce_max_pages(self.max_pages.as_ref()),
            collect_details: self.collect_details.unwrap_or(true),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Seeds in priority order: `startUrls`, `startUrl`, `url`, then the search URL.
    pub fn seed_urls(&self) -> Result<Vec<Url>, CrawlError> {
        let explicit: Vec<&str> = self
            .start_urls
            .iter()
            .map(SeedUrl::as_str)
            .chain(self.start_url.as_deref())
            .chain(self.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .collect();

        if explicit.is_empty() {
            return Ok(vec![build_start_url(
                self.keyword.as_deref(),
                self.location.as_deref(),
            )?]);
        }

        explicit
            .into_iter()
            .map(|raw| {
                let url = Url::parse(raw).map_err(|e| CrawlError::InvalidStartUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })?;
                if matches!(url.scheme(), "http" | "https") {
                    Ok(url)
                } else {
                    Err(CrawlError::InvalidStartUrl {
                        url: raw.to_string(),
                        reason: format!("unsupported scheme '{}'", url.scheme()),
                    })
                }
            })
            .collect()
    }
}

/// `https://www.efinancialcareers.com/jobs?q=<keyword>&location=<location>`.
///
/// Category has no URL parameter on the site; it only tags output records.
pub fn build_start_url(keyword: Option<&str>, location: Option<&str>) -> Result<Url, CrawlError> {
    let raw = format!("{SITE_ORIGIN}/jobs");
    let mut url = Url::parse(&raw).map_err(|e| CrawlError::InvalidStartUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
            query.append_pair("q", keyword);
        }
        if let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) {
            query.append_pair("location", location);
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

/// Loose numeric coercion: numbers, numeric strings and booleans.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Missing → 100, finite → `max(1, ceil(n))`, anything else → unlimited.
pub fn coerce_results_wanted(raw: Option<&Value>) -> usize {
    match raw {
        None | Some(Value::Null) => DEFAULT_RESULTS_WANTED,
        Some(Value::String(s)) if s.trim().is_empty() => DEFAULT_RESULTS_WANTED,
        Some(value) => match as_number(value) {
            Some(n) if n.is_finite() => n.ceil().max(1.0) as usize,
            _ => usize::MAX,
        },
    }
}

/// Missing or non-numeric → 10, finite → `max(1, ceil(n))`.
pub fn coerce_max_pages(raw: Option<&Value>) -> u32 {
    raw.and_then(as_number)
        .filter(|n| n.is_finite())
        .map(|n| n.ceil().max(1.0) as u32)
        .unwrap_or(DEFAULT_MAX_PAGES)
}

/// Scheduler tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub list_delay: Duration,
    pub detail_delay: Duration,
    pub max_jitter: Duration,
    pub retry_step: Duration,
    pub requests_per_minute: Option<u32>,
    pub request_timeout: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            max_retries: 3,
            list_delay: Duration::from_millis(1000),
            detail_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(2000),
            retry_step: Duration::from_millis(1500),
            requests_per_minute: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl CrawlSettings {
    /// Settings without politeness delays, for tests and local replays.
    pub fn immediate() -> Self {
        Self {
            list_delay: Duration::ZERO,
            detail_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            retry_step: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("EFC_LOG_FORMAT") {
            Ok(format) => match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "plain" => LogFormat::Text,
                _ => {
                    eprintln!(
                        "Warning: Invalid EFC_LOG_FORMAT value '{}', using default text",
                        format
                    );
                    LogFormat::Text
                }
            },
            Err(_) => LogFormat::Text,
        }
    }
}
