use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::CrawlError;

const APIFY_PROXY_HOST: &str = "proxy.apify.com:8000";
pub const APIFY_PROXY_PASSWORD_ENV: &str = "APIFY_PROXY_PASSWORD";

/// `proxyConfiguration` input object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfiguration {
    #[serde(default)]
    pub use_apify_proxy: bool,
    #[serde(default)]
    pub apify_proxy_groups: Vec<String>,
    #[serde(default)]
    pub apify_proxy_country: Option<String>,
    #[serde(default)]
    pub proxy_urls: Vec<String>,
}

impl ProxyConfiguration {
    pub fn from_value(value: Option<&Value>) -> Result<Self, CrawlError> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| CrawlError::Proxy(format!("malformed proxyConfiguration: {e}"))),
        }
    }

    /// Proxy endpoints to rotate through; empty means direct connections.
    ///
    /// Explicit `proxyUrls` win over the managed Apify proxy.
    pub fn proxy_urls(&self, apify_password: Option<&str>) -> Result<Vec<Url>, CrawlError> {
        if !self.proxy_urls.is_empty() {
            return self
                .proxy_urls
                .iter()
                .map(|raw| {
                    let url = Url::parse(raw.trim())
                        .map_err(|e| CrawlError::Proxy(format!("'{raw}': {e}")))?;
                    if matches!(url.scheme(), "http" | "https") {
                        Ok(url)
                    } else {
                        Err(CrawlError::Proxy(format!(
                            "'{raw}': unsupported scheme '{}'",
                            url.scheme()
                        )))
                    }
                })
                .collect();
        }

        if !self.use_apify_proxy {
            return Ok(Vec::new());
        }

        let password = apify_password
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                CrawlError::Proxy(format!(
                    "useApifyProxy is enabled but {APIFY_PROXY_PASSWORD_ENV} is not set"
                ))
            })?;

        let raw = format!("http://{}:{}@{}", self.apify_username(), password, APIFY_PROXY_HOST);
        Url::parse(&raw)
            .map(|url| vec![url])
            .map_err(|e| CrawlError::Proxy(e.to_string()))
    }

    fn apify_username(&self) -> String {
        let mut parts = Vec::new();
        if !self.apify_proxy_groups.is_empty() {
            parts.push(format!("groups-{}", self.apify_proxy_groups.join("+")));
        }
        if let Some(country) = self
            .apify_proxy_country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            parts.push(format!("country-{}", country.to_uppercase()));
        }
        if parts.is_empty() {
            "auto".to_string()
        } else {
            parts.join(",")
        }
    }
}
