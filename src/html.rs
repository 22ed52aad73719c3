//! Small HTML scanning helpers shared by the filters, generators and checker.
//!
//! Fragments are scanned with regular expressions over the whole text; no DOM
//! is built. Unmatched text is always preserved verbatim.

use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A complete heading element: level, attributes, inner HTML, closing tag.
pub(crate) static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([0-9]+)((?:\s[^>]*)?)>(.*?)(</h[0-9]+\s*>)").unwrap()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// `id` attribute with a double-quoted, single-quoted or unquoted value.
static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).unwrap()
});

static ENTITY_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").unwrap());

fn id_value<'h>(caps: &Captures<'h>) -> Option<&'h str> {
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Value of the `id` attribute in an attribute string, if any.
pub(crate) fn id_attribute(attrs: &str) -> Option<&str> {
    ID_ATTR.captures(attrs).and_then(|caps| id_value(&caps))
}

/// Every `id` attribute value in an HTML text.
pub(crate) fn all_ids(html: &str) -> impl Iterator<Item = &str> {
    ID_ATTR.captures_iter(html).filter_map(|caps| id_value(&caps))
}

/// Remove tags and collapse whitespace, keeping entity references as-is.
pub(crate) fn strip_tags(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode entity and character references, leaving unknown ones as written.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY_REF
        .replace_all(text, |caps: &Captures| {
            unescape_with(&caps[0], |entity| {
                resolve_predefined_entity(entity).or((entity == "nbsp").then_some("\u{a0}"))
            })
            .map_or_else(|_| caps[0].to_string(), |decoded| decoded.into_owned())
        })
        .into_owned()
}

/// Escape the characters HTML treats specially in text and attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain text of a heading's inner HTML.
pub(crate) fn heading_text(inner_html: &str) -> String {
    decode_entities(&strip_tags(inner_html))
}
