use serde::{Deserialize, Serialize};

use crate::fields::meta::job_id_from_str;

/// Tag carried by URL-only records.
pub const URL_ONLY_SOURCE: &str = "efinancialcareers";

/// A job posting as emitted to the output sink.
///
/// Every field except `url` is best-effort and may be `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
    pub description_text: Option<String>,
    pub category: Option<String>,
    pub url: String,
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl JobRecord {
    /// A record carrying only the posting URL, used when detail pages are not collected.
    pub fn url_only(url: &str, category: Option<&str>) -> Self {
        Self {
            job_id: job_id_from_str(url),
            category: category.map(ToString::to_string),
            url: url.to_string(),
            source: Some(URL_ONLY_SOURCE.to_string()),
            ..Default::default()
        }
    }

    /// Names of the extracted fields that came back empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("job_id", &self.job_id),
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("job_type", &self.job_type),
            ("salary", &self.salary),
            ("date_posted", &self.date_posted),
            ("description_html", &self.description_html),
            ("description_text", &self.description_text),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.is_none().then_some(name))
        .collect()
    }
}
