use scraper::Html;

use crate::dom::{element_text, non_empty};
use crate::patterns::{HEADING, OG_TITLE, SITE_TITLE, TITLE_TAG};

type TitleStrategy = fn(&Html) -> Option<String>;

const TITLE_STRATEGIES: &[TitleStrategy] = &[
    from_site_header,
    from_first_heading,
    from_og_title,
    from_title_tag,
];

const TITLE_SEPARATOR: char = '|';

pub fn extract_title(document: &Html) -> Option<String> {
    TITLE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(document))
}

fn from_site_header(document: &Html) -> Option<String> {
    SITE_TITLE.iter().find_map(|selector| {
        document
            .select(selector)
            .map(element_text)
            .find_map(|text| non_empty(&text))
    })
}

fn from_first_heading(document: &Html) -> Option<String> {
    document
        .select(&HEADING)
        .next()
        .and_then(|h1| non_empty(&element_text(h1)))
}

fn from_og_title(document: &Html) -> Option<String> {
    document
        .select(&OG_TITLE)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(first_segment)
}

fn from_title_tag(document: &Html) -> Option<String> {
    document
        .select(&TITLE_TAG)
        .next()
        .and_then(|title| first_segment(&element_text(title)))
}

/// `"Credit Analyst | eFinancialCareers"` -> `"Credit Analyst"`.
fn first_segment(text: &str) -> Option<String> {
    text.split(TITLE_SEPARATOR).next().and_then(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        r#"<html><body><h1>Generic</h1><div class="job-header"><h1>Header Title</h1></div></body></html>"#,
        Some("Header Title")
    )]
    #[case(
        r#"<html><body><h1 data-testid="job-title">  Quant   Developer </h1></body></html>"#,
        Some("Quant Developer")
    )]
    #[case(r#"<html><body><h1>First</h1><h1>Second</h1></body></html>"#, Some("First"))]
    #[case(
        r#"<html><head><meta property="og:title" content="Risk Manager | eFinancialCareers"></head><body><h1> </h1></body></html>"#,
        Some("Risk Manager")
    )]
    #[case(
        r#"<html><head><title>Trader | eFinancialCareers</title></head><body><p>x</p></body></html>"#,
        Some("Trader")
    )]
    #[case(r#"<html><head><title> | site</title></head><body></body></html>"#, None)]
    #[case(r#"<html><body><p>nothing here</p></body></html>"#, None)]
    fn test_extract_title(#[case] html: &str, #[case] expected: Option<&str>) {
        let document = Html::parse_document(html);
        assert_eq!(extract_title(&document).as_deref(), expected);
    }
}
