use miette::Diagnostic;
use thiserror::Error;

/// Startup failures. Any of these aborts the run before the first fetch.
#[derive(Debug, Error, Diagnostic)]
pub enum CrawlError {
    #[error("Failed to read input file '{path}': {source}")]
    #[diagnostic(
        code(efc_crawler::config::input_io),
        help("Check that the --input path exists and is readable.")
    )]
    InputIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Input file '{path}' is not valid JSON: {source}")]
    #[diagnostic(
        code(efc_crawler::config::input_json),
        help("The input must be a JSON object with keys such as keyword, location and results_wanted.")
    )]
    InputJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid start URL '{url}': {reason}")]
    #[diagnostic(code(efc_crawler::config::start_url))]
    InvalidStartUrl { url: String, reason: String },

    #[error("Invalid proxy configuration: {0}")]
    #[diagnostic(
        code(efc_crawler::proxy),
        help("Provide proxyUrls as absolute http(s) URLs, or set APIFY_PROXY_PASSWORD when useApifyProxy is enabled.")
    )]
    Proxy(String),

    #[error("Failed to build HTTP client: {0}")]
    #[diagnostic(code(efc_crawler::http_client))]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to open output '{path}': {source}")]
    #[diagnostic(code(efc_crawler::sink))]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A failed page fetch. Only transient failures are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },
    #[error("Request to {url} failed with status: {status}")]
    Permanent { url: String, status: u16 },
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write records: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output writer lock poisoned")]
    Poisoned,
}
