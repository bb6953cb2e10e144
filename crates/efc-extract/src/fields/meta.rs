use scraper::Html;
use url::Url;

use crate::dom::short_texts;
use crate::patterns::{JOB_POSTING_PATH, NAMED_DATE, RELATIVE_DATE, SALARY};

const MAX_DATE_CHARS: usize = 120;
const MAX_JOB_TYPE_CHARS: usize = 40;
const MAX_SALARY_CHARS: usize = 100;

const JOB_TYPES: &[&str] = &[
    "Permanent",
    "Contract",
    "Full time",
    "Part time",
    "Temporary",
    "Freelance",
    "Internship",
];

pub fn job_id_from_url(url: &Url) -> Option<String> {
    job_id_from_str(url.path())
}

pub fn job_id_from_str(path_or_url: &str) -> Option<String> {
    JOB_POSTING_PATH
        .captures(path_or_url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Relative age such as `3 days ago`, or `today`/`yesterday`/`just now`.
pub fn extract_date_posted(document: &Html) -> Option<String> {
    short_texts(document, MAX_DATE_CHARS).find_map(|text| {
        RELATIVE_DATE
            .captures(&text)
            .or_else(|| NAMED_DATE.captures(&text))
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Canonical job type label for the first node whose whole text names one.
pub fn extract_job_type(document: &Html) -> Option<String> {
    short_texts(document, MAX_JOB_TYPE_CHARS).find_map(|text| canonical_job_type(&text))
}

fn canonical_job_type(text: &str) -> Option<String> {
    let normalized = text.trim().replace('-', " ").to_lowercase();
    JOB_TYPES
        .iter()
        .find(|label| label.to_lowercase() == normalized)
        .map(|label| label.to_string())
}

pub fn extract_salary(document: &Html) -> Option<String> {
    short_texts(document, MAX_SALARY_CHARS).find_map(|text| {
        SALARY
            .find(&text)
            .map(|m| m.as_str().trim().to_string())
            .filter(|salary| !salary.is_empty())
    })
}
