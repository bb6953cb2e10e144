use std::sync::LazyLock;

use efc_extract::patterns::JOB_POSTING_PATH;
use scraper::{Html, Selector};
use url::Url;

use crate::state::SeenSet;

#[allow(clippy::expect_used)]
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Failed to parse 'a[href]' selector"));

/// Job posting links of a listing page in document order.
///
/// Links are resolved against `base_url` with their fragment removed. A link
/// is only returned when it was not in `seen` yet, and at most `limit` links
/// are claimed; the rest stay unseen for later pages.
pub fn discover_job_links(
    document: &Html,
    base_url: &Url,
    seen: &SeenSet,
    limit: usize,
) -> Vec<Url> {
    let mut found_urls = Vec::new();
    if limit == 0 {
        return found_urls;
    }

    for element in document.select(&LINK_SELECTOR) {
        let Some(href_attr) = element.value().attr("href") else {
            continue;
        };
        match base_url.join(href_attr) {
            Ok(mut new_url) => {
                new_url.set_fragment(None);
                if !is_job_posting(&new_url) {
                    continue;
                }
                if seen.insert(new_url.as_str()) {
                    found_urls.push(new_url);
                    if found_urls.len() >= limit {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::debug!(
                    "Failed to parse or join URL '{}' with base '{}': {}",
                    href_attr,
                    base_url,
                    e
                );
            }
        }
    }
    tracing::debug!("Discovered {} new job links on {}", found_urls.len(), base_url);
    found_urls
}

fn is_job_posting(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && JOB_POSTING_PATH.is_match(url.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = "https://www.efinancialcareers.com/jobs?q=analyst&page=1";

    fn discover(html: &str, base_url: &str, seen: &SeenSet) -> Vec<String> {
        let document = Html::parse_document(html);
        let base = Url::parse(base_url).unwrap();
        discover_job_links(&document, &base, seen, usize::MAX)
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[rstest]
    #[case("<html><body><p>No links here.</p></body></html>", BASE, vec![])]
    #[case(
        r#"<html><body><a href="/jobs-NY-Analyst.id111">Analyst</a></body></html>"#,
        BASE,
        vec!["https://www.efinancialcareers.com/jobs-NY-Analyst.id111"]
    )]
    #[case(
        r#"<html><body><a href="jobs-UK-London-Trader.id222#apply">Trader</a></body></html>"#,
        "https://www.efinancialcareers.com/",
        vec!["https://www.efinancialcareers.com/jobs-UK-London-Trader.id222"]
    )]
    #[case(
        r##"
            <html><body>
                <a href="https://www.efinancialcareers.com/JOBS-SG-Quant.ID333?src=list">Quant</a>
                <a href="/jobs?q=analyst&page=2">Next</a>
                <a href="/companies/barclays">Company</a>
                <a href="#top">Top</a>
                <a href="mailto:jobs-x.id1@example.com">Mail</a>
            </body></html>
        "##,
        BASE,
        vec!["https://www.efinancialcareers.com/JOBS-SG-Quant.ID333?src=list"]
    )]
    #[case(
        r#"<html><body><a href="http://[::1]:namedport/jobs-x.id1">Malformed</a></body></html>"#,
        BASE,
        vec![]
    )]
    #[case("", BASE, vec![])]
    fn test_discover_job_links(
        #[case] html: &str,
        #[case] base_url: &str,
        #[case] expected_urls: Vec<&str>,
    ) {
        let seen = SeenSet::new();
        assert_eq!(discover(html, base_url, &seen), expected_urls);
    }

    #[test]
    fn test_duplicates_within_page_and_across_pages() {
        let seen = SeenSet::new();
        let page_one = r#"<a href="/jobs-NY-Analyst.id111">A</a>
            <a href="/jobs-NY-Analyst.id111">A again</a>
            <a href="/jobs-LDN-Trader.id222">B</a>"#;
        assert_eq!(
            discover(page_one, BASE, &seen),
            vec![
                "https://www.efinancialcareers.com/jobs-NY-Analyst.id111",
                "https://www.efinancialcareers.com/jobs-LDN-Trader.id222",
            ]
        );

        let page_two = r#"<a href="/jobs-LDN-Trader.id222">B</a><a href="/jobs-HK-Sales.id333">C</a>"#;
        assert_eq!(
            discover(page_two, BASE, &seen),
            vec!["https://www.efinancialcareers.com/jobs-HK-Sales.id333"]
        );
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_limit_leaves_remaining_links_unseen() {
        let seen = SeenSet::new();
        let document = Html::parse_document(
            r#"<a href="/jobs-a.id1">1</a><a href="/jobs-b.id2">2</a><a href="/jobs-c.id3">3</a>"#,
        );
        let base = Url::parse(BASE).unwrap();
        let links = discover_job_links(&document, &base, &seen, 2);
        assert_eq!(links.len(), 2);
        assert!(!seen.contains("https://www.efinancialcareers.com/jobs-c.id3"));
        assert!(discover_job_links(&document, &base, &seen, 0).is_empty());
    }
}
