use ego_tree::NodeRef;
use itertools::Itertools;
use scraper::{ElementRef, Html, Node};

use crate::patterns::BODY_ELEMENTS;

const SKIPPED_TEXT_CONTAINERS: &[&str] = &["script", "style", "noscript", "template"];

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn push_visible_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if !SKIPPED_TEXT_CONTAINERS.contains(&el.name()) => {
                push_visible_text(child, out);
            }
            _ => {}
        }
    }
}

/// Visible descendant text of an element with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_visible_text(*element, &mut text);
    collapse_whitespace(&text)
}

pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn has_text(document: &Html) -> bool {
    document
        .root_element()
        .text()
        .any(|chunk| !chunk.trim().is_empty())
}

/// Collapsed text of every body element no longer than `max_chars`, in document order.
pub(crate) fn short_texts(document: &Html, max_chars: usize) -> impl Iterator<Item = String> + '_ {
    document
        .select(&BODY_ELEMENTS)
        .filter(|el| !SKIPPED_TEXT_CONTAINERS.contains(&el.value().name()))
        .map(element_text)
        .filter(move |text| !text.is_empty() && char_len(text) <= max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  a \n\t b  ", "a b")]
    #[case("", "")]
    #[case("single", "single")]
    fn test_collapse_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(collapse_whitespace(input), expected);
    }

    #[test]
    fn test_short_texts_in_document_order() {
        let document = Html::parse_document(
            "<html><body><div><span>Permanent</span><script>var x = 1;</script></div><p>a much longer paragraph of text</p></body></html>",
        );
        let texts: Vec<String> = short_texts(&document, 12).collect();
        assert_eq!(texts, vec!["Permanent", "Permanent"]);
    }
}
