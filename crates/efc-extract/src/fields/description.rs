//! Description block selection.
//!
//! Block-level elements are scored as `text length + keyword hits * weight`;
//! a block only qualifies when it is long enough, mentions at least one job
//! keyword and contains none of the boilerplate markers. When nothing
//! qualifies, standalone paragraphs and list items are stitched together.

use itertools::Itertools;
use scraper::{ElementRef, Html};

use crate::dom::{char_len, element_text};
use crate::patterns::{DESCRIPTION_CANDIDATE, PARAGRAPH_OR_ITEM};

const MIN_CANDIDATE_CHARS: usize = 300;
const MIN_FALLBACK_CHARS: usize = 40;
const MIN_FALLBACK_ELEMENTS: usize = 4;
const KEYWORD_WEIGHT: usize = 50;

const JOB_KEYWORDS: &[&str] = &[
    "responsibilities",
    "requirements",
    "qualifications",
    "experience",
    "skills",
    "benefits",
    "description",
];

const BOILERPLATE_MARKERS: &[&str] = &[
    "recommended jobs",
    "similar jobs",
    "sign in",
    "apply now",
    "create job alert",
];

/// A provisional description block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFragment {
    pub text: String,
    pub html: String,
    pub score: usize,
}

/// Raw inner HTML of the best description block, or the stitched fallback.
pub fn extract_description(document: &Html) -> Option<String> {
    best_candidate(document)
        .map(|candidate| candidate.html)
        .or_else(|| stitched_paragraphs(document))
}

pub fn best_candidate(document: &Html) -> Option<CandidateFragment> {
    document
        .select(&DESCRIPTION_CANDIDATE)
        .filter_map(score_candidate)
        // Strictly greater keeps the first block on ties.
        .fold(None, |best: Option<CandidateFragment>, candidate| match best {
            Some(best) if best.score >= candidate.score => Some(best),
            _ => Some(candidate),
        })
}

fn score_candidate(element: ElementRef<'_>) -> Option<CandidateFragment> {
    let text = element_text(element);
    let length = char_len(&text);
    if length <= MIN_CANDIDATE_CHARS {
        return None;
    }

    let lowered = text.to_lowercase();
    if is_boilerplate(&lowered) {
        return None;
    }
    let hits = keyword_hits(&lowered);
    if hits == 0 {
        return None;
    }

    Some(CandidateFragment {
        score: length + hits * KEYWORD_WEIGHT,
        html: element.inner_html(),
        text,
    })
}

fn keyword_hits(lowered: &str) -> usize {
    JOB_KEYWORDS
        .iter()
        .map(|keyword| lowered.matches(keyword).count())
        .sum()
}

fn is_boilerplate(lowered: &str) -> bool {
    BOILERPLATE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn stitched_paragraphs(document: &Html) -> Option<String> {
    let blocks: Vec<String> = document
        .select(&PARAGRAPH_OR_ITEM)
        .filter(|element| !is_nested_block(*element))
        .filter(|element| {
            let text = element_text(*element);
            char_len(&text) > MIN_FALLBACK_CHARS && !is_boilerplate(&text.to_lowercase())
        })
        .map(|element| element.html())
        .collect();

    (blocks.len() >= MIN_FALLBACK_ELEMENTS).then(|| blocks.iter().join("\n"))
}

fn is_nested_block(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "p" | "li"))
}
