//! Compiled regex patterns and CSS selectors shared by the extractors.
//!
//! Everything here is a compile-time constant, built once on first use.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex_lite::Regex;
use scraper::Selector;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

fn selectors(css: &[&str]) -> Vec<Selector> {
    css.iter().map(|c| selector(c)).collect()
}

/// Job posting path: `/jobs-<location-slug>.id<numeric-id>`.
pub static JOB_POSTING_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/jobs-[^/]+\.id(\d+)").expect("JOB_POSTING_PATH regex"));

/// Relative posting age, e.g. `Posted 3 days ago`.
pub static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:posted\s*:?\s+)?(\d+\+?\s+(?:minute|hour|day|week|month)s?\s+ago)")
        .expect("RELATIVE_DATE regex")
});

/// Named posting age, e.g. `Posted today`.
pub static NAMED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bposted\s*:?\s+(today|yesterday|just now)\b").expect("NAMED_DATE regex")
});

/// Currency-prefixed amount with optional range and unit, or the literal `Competitive`.
pub static SALARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:[£$€]\s?\d[\d,]*(?:\.\d+)?[km]?",
        r"(?:\s*(?:-|–|to)\s*[£$€]?\s?\d[\d,]*(?:\.\d+)?[km]?)?",
        r"(?:\s*(?:per\s+(?:annum|year|month|week|day|hour)|p\.a\.?|pa\b|/\s?(?:yr|year|month|day|hour|hr)))?",
        r"|\bcompetitive\b)"
    ))
    .expect("SALARY regex")
});

/// `<company> <City>, <Region>` where the city is a single capitalized word.
pub static COMPANY_CITY_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<company>.+?)\s+(?P<location>[A-Z][A-Za-z.'\-]*,\s*[A-Z][A-Za-z.'\-]*(?:\s+[A-Z][A-Za-z.'\-]*)*)$",
    )
    .expect("COMPANY_CITY_REGION regex")
});

/// Capitalized word, optionally followed by a comma (`London,`).
pub static CAPITALIZED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+,?$").expect("CAPITALIZED_TOKEN regex"));

/// Upper-case code such as `NY` or `UK`.
pub static UPPERCASE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,},?$").expect("UPPERCASE_TOKEN regex"));

/// Title selectors for the posting header, most specific first.
pub static SITE_TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        "[data-testid='job-title']",
        "h1.job-title",
        ".job-header h1",
        ".details-header h1",
    ])
});

pub static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));

pub static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector("meta[property='og:title'], meta[name='og:title']"));

pub static TITLE_TAG: LazyLock<Selector> = LazyLock::new(|| selector("title"));

/// Combined company/location sub-line under the title.
pub static SITE_COMPANY_LOCATION: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        "[data-testid='job-company-location']",
        ".job-header .company-location",
        ".details-header .company",
    ])
});

pub static HEADER_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("p, div, span"));

pub static DESCRIPTION_CANDIDATE: LazyLock<Selector> =
    LazyLock::new(|| selector("div, section, article, main"));

pub static PARAGRAPH_OR_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("p, li"));

pub static BODY_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| selector("body *"));

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/jobs-NY-Analyst.id111", Some("111"))]
    #[case("/JOBS-London-Trader.ID222", Some("222"))]
    #[case("/jobs/search?page=2", None)]
    #[case("/jobs-london", None)]
    fn test_job_posting_path(#[case] path: &str, #[case] expected: Option<&str>) {
        let id = JOB_POSTING_PATH
            .captures(path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        assert_eq!(id, expected);
    }

    #[rstest]
    #[case("£50,000 - £60,000", "£50,000 - £60,000")]
    #[case("$120k - $150k per annum", "$120k - $150k per annum")]
    #[case("€500 per day", "€500 per day")]
    #[case("Salary: £45,000.50", "£45,000.50")]
    #[case("Competitive", "Competitive")]
    #[case("$90,000 to $110,000/yr", "$90,000 to $110,000/yr")]
    fn test_salary_pattern(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(SALARY.find(text).map(|m| m.as_str().trim()), Some(expected));
    }

    #[test]
    fn test_all_selectors_compile() {
        assert_eq!(SITE_TITLE.len(), 4);
        assert_eq!(SITE_COMPANY_LOCATION.len(), 3);
        LazyLock::force(&HEADING);
        LazyLock::force(&OG_TITLE);
        LazyLock::force(&TITLE_TAG);
        LazyLock::force(&HEADER_BLOCK);
        LazyLock::force(&DESCRIPTION_CANDIDATE);
        LazyLock::force(&PARAGRAPH_OR_ITEM);
        LazyLock::force(&BODY_ELEMENTS);
    }
}
