//! Reduces a raw description fragment to clean HTML and plain text.
//!
//! The HTML output keeps only semantic markup: component elements (custom
//! tags such as `<efc-job-description>`) are unwrapped, interactive and
//! structural chrome is removed with its content, every attribute is dropped
//! and emptied tag pairs collapse. Re-sanitizing the output is a no-op.

use ego_tree::NodeRef;
use scraper::{Html, Node};

use crate::dom::collapse_whitespace;

const MAX_PASSES: usize = 4;

/// Dropped from the plain text output together with their content.
const NON_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "template", "svg", "canvas", "video", "audio",
    "object", "embed",
];

/// Dropped from the HTML output together with their content.
const CHROME_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "template", "svg", "canvas", "video", "audio",
    "object", "embed", "img", "picture", "source", "link", "meta", "button", "form", "input",
    "select", "option", "textarea", "label", "nav", "header", "footer", "aside", "dialog",
];

/// Followed by a space in the plain text output so words of adjacent blocks stay apart.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "li", "ul", "ol", "dl", "dt", "dd", "h1", "h2", "h3", "h4",
    "h5", "h6", "br", "hr", "table", "tr", "td", "th", "blockquote", "pre",
];

const VOID_ELEMENTS: &[&str] = &["br", "hr", "wbr"];

/// The parser drops one newline directly after these start tags.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "listing", "textarea"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedDescription {
    pub html: Option<String>,
    pub text: Option<String>,
}

pub fn sanitize_description(fragment: Option<&str>) -> SanitizedDescription {
    match fragment {
        Some(fragment) => SanitizedDescription {
            html: clean_html(fragment),
            text: clean_text(fragment),
        },
        None => SanitizedDescription::default(),
    }
}

/// Visible text of a fragment, whitespace collapsed; `None` when empty.
pub fn clean_text(fragment: &str) -> Option<String> {
    let parsed = Html::parse_fragment(fragment);
    let mut text = String::new();
    collect_text(*parsed.root_element(), &mut text);
    let text = collapse_whitespace(&text);
    (!text.is_empty()).then_some(text)
}

/// Attribute-free semantic HTML of a fragment; `None` when nothing is left.
pub fn clean_html(fragment: &str) -> Option<String> {
    let mut current = fragment.trim().to_string();
    for _ in 0..MAX_PASSES {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    (!current.is_empty()).then_some(current)
}

fn sanitize_pass(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let mut out = String::new();
    // The fragment parser wraps content in a synthetic <html> element.
    for child in parsed.root_element().children() {
        write_node(child, &mut out);
    }
    out.trim().to_string()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if !NON_TEXT_ELEMENTS.contains(&el.name()) => {
                collect_text(child, out);
                if BLOCK_ELEMENTS.contains(&el.name()) {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn write_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => escape_text(text, out),
        Node::Element(el) => {
            let name = el.name();
            if CHROME_ELEMENTS.contains(&name) || is_link_button(el) {
                return;
            }
            if is_component_element(name) {
                for child in node.children() {
                    write_node(child, out);
                }
                return;
            }
            if VOID_ELEMENTS.contains(&name) {
                out.push('<');
                out.push_str(name);
                out.push('>');
                return;
            }

            let mut inner = String::new();
            for child in node.children() {
                write_node(child, &mut inner);
            }
            if inner.trim().is_empty() {
                if !inner.is_empty() {
                    out.push(' ');
                }
                return;
            }
            out.push('<');
            out.push_str(name);
            out.push('>');
            if LEADING_NEWLINE_ELEMENTS.contains(&name) && inner.starts_with('\n') {
                out.push('\n');
            }
            out.push_str(&inner);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        _ => {}
    }
}

/// Framework-authored tags follow the custom element naming rule (contain a hyphen).
fn is_component_element(name: &str) -> bool {
    name.contains('-')
}

fn is_link_button(el: &scraper::node::Element) -> bool {
    el.name() == "a"
        && (el.attr("role") == Some("button")
            || el
                .classes()
                .any(|class| class.contains("btn") || class.contains("button")))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
