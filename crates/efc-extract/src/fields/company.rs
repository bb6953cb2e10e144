//! Company and location from the short sub-line next to the posting title.
//!
//! Splitting `"<company> <location>"` is natural-language parsing with no
//! deterministic grammar. Two grammars are tried in order and, when neither
//! separates a location confidently, the whole block is kept as the company
//! with no location. Company names made of trailing capitalized words
//! (e.g. `"Goldman Sachs London"`) defeat the token scan and end up in that
//! fallback; this is a known limitation of the heuristic.

use itertools::Itertools;
use scraper::{ElementRef, Html};

use crate::dom::{char_len, collapse_whitespace, element_text};
use crate::patterns::{
    CAPITALIZED_TOKEN, COMPANY_CITY_REGION, HEADER_BLOCK, HEADING, SITE_COMPANY_LOCATION,
    UPPERCASE_TOKEN,
};

const MIN_BLOCK_CHARS: usize = 5;
const MAX_BLOCK_CHARS: usize = 200;
const MAX_LOCATION_TOKENS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyLocation {
    pub company: Option<String>,
    pub location: Option<String>,
}

type BlockStrategy = fn(&Html, Option<&str>) -> Option<String>;

const BLOCK_STRATEGIES: &[BlockStrategy] = &[
    from_site_subline,
    from_heading_container,
    from_heading_sibling,
    from_container_text,
];

pub fn extract_company_location(document: &Html, title: Option<&str>) -> CompanyLocation {
    BLOCK_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(document, title))
        .map(|block| parse_company_location(&block))
        .unwrap_or_default()
}

/// Splits a header block into company and location, best-effort.
pub fn parse_company_location(block: &str) -> CompanyLocation {
    let block = collapse_whitespace(block);
    if block.is_empty() {
        return CompanyLocation::default();
    }

    split_city_region(&block)
        .or_else(|| split_trailing_tokens(&block))
        .unwrap_or(CompanyLocation {
            company: Some(block),
            location: None,
        })
}

/// `"Barclays London, United Kingdom"` -> (`Barclays`, `London, United Kingdom`).
fn split_city_region(block: &str) -> Option<CompanyLocation> {
    let captures = COMPANY_CITY_REGION.captures(block)?;
    let company = captures.name("company")?.as_str().trim();
    let location = captures.name("location")?.as_str().trim();
    if company.is_empty() {
        return None;
    }
    Some(CompanyLocation {
        company: Some(company.to_string()),
        location: Some(location.to_string()),
    })
}

/// Trailing run of capitalized or upper-case tokens taken as location.
fn split_trailing_tokens(block: &str) -> Option<CompanyLocation> {
    let tokens: Vec<&str> = block.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }

    let location_len = tokens
        .iter()
        .rev()
        .take(MAX_LOCATION_TOKENS)
        .take_while(|token| is_location_token(token))
        .count();
    if location_len == 0 || location_len == tokens.len() {
        return None;
    }

    let (company, location) = tokens.split_at(tokens.len() - location_len);
    Some(CompanyLocation {
        company: Some(company.join(" ")),
        location: Some(
            location
                .iter()
                .map(|token| token.trim_end_matches(','))
                .join(", "),
        ),
    })
}

fn is_location_token(token: &str) -> bool {
    CAPITALIZED_TOKEN.is_match(token) || UPPERCASE_TOKEN.is_match(token)
}

fn within_bounds(text: &str) -> bool {
    (MIN_BLOCK_CHARS..=MAX_BLOCK_CHARS).contains(&char_len(text))
}

fn first_heading(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&HEADING).next()
}

fn heading_container(document: &Html) -> Option<ElementRef<'_>> {
    first_heading(document)?.parent().and_then(ElementRef::wrap)
}

fn is_candidate_block(text: &str, title: Option<&str>) -> bool {
    within_bounds(text) && title.is_none_or(|title| !text.contains(title))
}

fn from_site_subline(document: &Html, _title: Option<&str>) -> Option<String> {
    SITE_COMPANY_LOCATION.iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .find(|text| within_bounds(text))
    })
}

fn from_heading_container(document: &Html, title: Option<&str>) -> Option<String> {
    heading_container(document)?
        .select(&HEADER_BLOCK)
        .map(element_text)
        .find(|text| is_candidate_block(text, title))
}

fn from_heading_sibling(document: &Html, title: Option<&str>) -> Option<String> {
    first_heading(document)?
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .map(element_text)
        .find(|text| !text.is_empty())
        .filter(|text| is_candidate_block(text, title))
}

fn from_container_text(document: &Html, title: Option<&str>) -> Option<String> {
    let text = element_text(heading_container(document)?);
    let remainder = match title {
        Some(title) => text.replacen(title, "", 1),
        None => text,
    };
    let remainder = collapse_whitespace(&remainder);
    within_bounds(&remainder).then_some(remainder)
}
