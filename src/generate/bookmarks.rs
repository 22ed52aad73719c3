//! PDF bookmark outline generator.

use super::{collect_outline, max_level, GeneratorConfig, PseudoSectionGenerator};
use crate::error::Result;
use crate::html::escape_html;
use crate::model::{Document, Outline, OutlineItem};

/// Emits a nested `<bookmarks>` outline for the document head.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookmarkGenerator;

impl BookmarkGenerator {
    pub const NAME: &'static str = "bookmarks";

    /// Build the outline tree: one item per section, headings nested by level.
    pub fn outline(doc: &Document, max_level: i32) -> Outline {
        let mut outline = Outline::new();
        for section in collect_outline(doc, max_level) {
            let mut item = OutlineItem::new(section.title, section.id, 0);
            for heading in section.headings {
                attach(
                    &mut item.children,
                    OutlineItem::new(heading.text, heading.id, heading.level),
                );
            }
            outline.add_item(item);
        }
        outline
    }
}

impl PseudoSectionGenerator for BookmarkGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(&self, doc: &Document, config: &GeneratorConfig) -> Result<String> {
        let outline = Self::outline(doc, max_level(config)?);
        let mut out = String::from("<bookmarks>\n");
        for item in &outline.items {
            write_item(&mut out, item, 1);
        }
        out.push_str("</bookmarks>\n");
        Ok(out)
    }
}

/// Place `item` under the deepest trailing sibling with a lower level.
fn attach(siblings: &mut Vec<OutlineItem>, item: OutlineItem) {
    match siblings.last_mut() {
        Some(last) if last.level < item.level => attach(&mut last.children, item),
        _ => siblings.push(item),
    }
}

fn write_item(out: &mut String, item: &OutlineItem, depth: usize) {
    let indent = "  ".repeat(depth);
    let open = format!(
        "{}<bookmark name=\"{}\" href=\"#{}\"",
        indent,
        escape_html(&item.title),
        escape_html(&item.target)
    );
    if item.children.is_empty() {
        out.push_str(&open);
        out.push_str("/>\n");
        return;
    }
    out.push_str(&open);
    out.push_str(">\n");
    for child in &item.children {
        write_item(out, child, depth + 1);
    }
    out.push_str(&indent);
    out.push_str("</bookmark>\n");
}
