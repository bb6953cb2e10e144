//! Heuristic extraction of job posting fields from detail pages.
//!
//! Job detail pages carry no stable structural markup, so every field is
//! located by a cascade of independent strategies that short-circuit on the
//! first usable result. All extractors are best-effort: a field that cannot
//! be located is recorded as `None`, never as an error.
//!
//! # Features
//!
//! - Title, company/location, description, date posted, job type, salary and
//!   job id extraction
//! - Description block selection by keyword-weighted scoring with
//!   boilerplate exclusion
//! - HTML sanitizing into a clean description fragment and plain text
//!
//! # Usage
//!
//! ```rust,ignore
//! use url::Url;
//!
//! let url = Url::parse("https://www.efinancialcareers.com/jobs-UK-London-Analyst.id123")?;
//! let record = efc_extract::extract_job(&html, &url, Some("Banking"))?;
//! println!("{:?} at {:?}", record.title, record.company);
//! ```
//!
//! # Determinism
//!
//! Given identical markup the extractors always yield identical values;
//! ties between description candidates resolve to the first in document
//! order.
pub mod error;
pub mod fields;
pub mod patterns;
pub mod record;
pub mod sanitize;

mod dom;

pub use error::ExtractError;
pub use fields::company::CompanyLocation;
pub use record::JobRecord;
pub use sanitize::SanitizedDescription;

use scraper::Html;
use url::Url;

/// Builds a [`JobRecord`] from the raw markup of a detail page.
pub fn extract_job(html: &str, url: &Url, category: Option<&str>) -> Result<JobRecord, ExtractError> {
    let document = Html::parse_document(html);
    extract_job_from_document(&document, url, category)
}

/// Same as [`extract_job`] for an already parsed document.
pub fn extract_job_from_document(
    document: &Html,
    url: &Url,
    category: Option<&str>,
) -> Result<JobRecord, ExtractError> {
    if !dom::has_text(document) {
        return Err(ExtractError::EmptyPage {
            url: url.to_string(),
        });
    }

    let title = fields::title::extract_title(document);
    let CompanyLocation { company, location } =
        fields::company::extract_company_location(document, title.as_deref());
    let description_fragment = fields::description::extract_description(document);
    let SanitizedDescription {
        html: description_html,
        text: description_text,
    } = sanitize::sanitize_description(description_fragment.as_deref());

    Ok(JobRecord {
        job_id: fields::meta::job_id_from_url(url),
        title,
        company,
        location,
        job_type: fields::meta::extract_job_type(document),
        salary: fields::meta::extract_salary(document),
        date_posted: fields::meta::extract_date_posted(document),
        description_html,
        description_text,
        category: category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string),
        url: url.to_string(),
        source: None,
    })
}
