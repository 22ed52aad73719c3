//! Document-level types.

use super::{Chapter, ContentSection, RepoRegistry, Section};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered document metadata.
pub type Metadata = IndexMap<String, String>;

/// Attributes of one pass-through head element (`link`, `meta`, `base`).
pub type HeadAttributes = IndexMap<String, String>;

/// Processing stage of a document.
///
/// A document only moves forward: chapter HTML is rewritten while `Parsed`,
/// generated sections are filled while `Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStage {
    /// Tree built, chapter HTML as converted
    #[default]
    Parsed,
    /// Post-processing pipeline applied
    Processed,
    /// Pseudo and header sections generated
    Generated,
}

/// An assembled document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Base name of the TOC file; prefixes every section id
    pub toc_base_name: String,

    /// Title from `<header title>`
    pub title: Option<String>,

    /// Metadata from properties and header, in declaration order
    pub metadata: Metadata,

    /// Pass-through head elements, grouped by tag name
    pub head_meta: IndexMap<String, Vec<HeadAttributes>>,

    /// Stylesheet paths, in declaration order
    pub style_sheets: Vec<String>,

    /// Declared content repositories
    pub repos: RepoRegistry,

    /// Sections generated into the document head
    pub header_sections: Vec<Section>,

    /// Body sections in TOC order
    pub sections: Vec<Section>,

    /// Post-processors requested by the TOC, with their attributes
    pub post_processors: Vec<(String, IndexMap<String, String>)>,

    /// Current processing stage
    pub stage: DocumentStage,
}

impl Document {
    /// Create a new empty document.
    pub fn new(toc_base_name: impl Into<String>) -> Self {
        Self {
            toc_base_name: toc_base_name.into(),
            ..Default::default()
        }
    }

    /// Set the title and mirror it into the metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.metadata.insert("title".to_string(), title.clone());
        self.title = Some(title);
    }

    /// Record a pass-through head element.
    pub fn add_head_element(&mut self, tag: &str, attributes: HeadAttributes) {
        if tag == "link"
            && attributes
                .get("rel")
                .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"))
        {
            if let Some(href) = attributes.get("href") {
                self.style_sheets.push(href.clone());
            }
        }
        self.head_meta
            .entry(tag.to_string())
            .or_default()
            .push(attributes);
    }

    /// Number of body sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of chapters across all content sections.
    pub fn chapter_count(&self) -> usize {
        self.content_sections().map(|s| s.chapters.len()).sum()
    }

    /// Check if the document has no sections at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.header_sections.is_empty()
    }

    /// Anchor id of a section.
    pub fn section_id(&self, section: &Section) -> String {
        section.id(&self.toc_base_name)
    }

    /// Iterate content sections in document order.
    pub fn content_sections(&self) -> impl Iterator<Item = &ContentSection> {
        self.sections.iter().filter_map(Section::as_content)
    }

    /// Iterate every chapter together with its owning section.
    pub fn chapters(&self) -> impl Iterator<Item = ChapterRef<'_>> {
        self.content_sections().flat_map(move |section| {
            let section_id = crate::ids::section_id(&self.toc_base_name, &section.name);
            section.chapters.iter().map(move |chapter| ChapterRef {
                section,
                chapter_id: chapter.id(&section_id),
                section_id: section_id.clone(),
                chapter,
            })
        })
    }

    /// Iterate every section, header sections first.
    pub fn all_sections(&self) -> impl Iterator<Item = &Section> {
        self.header_sections.iter().chain(self.sections.iter())
    }
}

/// A chapter viewed from its owning section.
#[derive(Debug, Clone)]
pub struct ChapterRef<'a> {
    pub section: &'a ContentSection,
    pub section_id: String,
    pub chapter: &'a Chapter,
    pub chapter_id: String,
}

impl ChapterRef<'_> {
    /// Heading shift applied to this chapter.
    pub fn effective_level(&self) -> i32 {
        self.chapter.effective_level(self.section.level)
    }
}

/// Nested outline (bookmarks) of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outline {
    /// Top-level outline items
    pub items: Vec<OutlineItem>,
}

impl Outline {
    /// Create a new empty outline.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item to the outline.
    pub fn add_item(&mut self, item: OutlineItem) {
        self.items.push(item);
    }

    /// Check if the outline is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the total number of items (including nested).
    pub fn total_items(&self) -> usize {
        fn count_items(items: &[OutlineItem]) -> usize {
            items
                .iter()
                .map(|item| 1 + count_items(&item.children))
                .sum()
        }
        count_items(&self.items)
    }
}

/// A single outline item (bookmark).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItem {
    /// Item title
    pub title: String,

    /// Anchor id the item points at
    pub target: String,

    /// Heading level of the target
    pub level: i32,

    /// Child items
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Create a new outline item.
    pub fn new(title: impl Into<String>, target: impl Into<String>, level: i32) -> Self {
        Self {
            title: title.into(),
            target: target.into(),
            level,
            children: Vec::new(),
        }
    }

    /// Add a child item.
    pub fn add_child(&mut self, child: OutlineItem) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Repo;
    use std::sync::Arc;
    use url::Url;

    #[test]
    fn test_document_new() {
        let doc = Document::new("manual");
        assert!(doc.is_empty());
        assert_eq!(doc.chapter_count(), 0);
        assert_eq!(doc.stage, DocumentStage::Parsed);
    }

    #[test]
    fn test_title_mirrors_metadata() {
        let mut doc = Document::new("manual");
        doc.set_title("User Manual");
        assert_eq!(doc.title.as_deref(), Some("User Manual"));
        assert_eq!(doc.metadata.get("title").map(String::as_str), Some("User Manual"));
    }

    #[test]
    fn test_head_elements() {
        let mut doc = Document::new("manual");
        let mut css = HeadAttributes::new();
        css.insert("rel".into(), "stylesheet".into());
        css.insert("href".into(), "style.css".into());
        doc.add_head_element("link", css);

        let mut meta = HeadAttributes::new();
        meta.insert("name".into(), "author".into());
        doc.add_head_element("meta", meta.clone());
        doc.add_head_element("meta", meta);

        assert_eq!(doc.style_sheets, vec!["style.css".to_string()]);
        assert_eq!(doc.head_meta["meta"].len(), 2);
    }

    #[test]
    fn test_chapter_iteration() {
        let repo = Arc::new(Repo {
            id: "main".into(),
            base_uri: Url::parse("file:///repo/").unwrap(),
        });
        let mut section = ContentSection::new("S1", 2);
        section
            .chapters
            .push(Chapter::new("intro", repo.clone(), "").with_level_offset(1));
        section.chapters.push(Chapter::new("usage", repo, ""));

        let mut doc = Document::new("test");
        doc.sections.push(Section::Content(section));

        let refs: Vec<_> = doc.chapters().collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].section_id, "test-s1");
        assert_eq!(refs[0].chapter_id, "test-s1-intro");
        assert_eq!(refs[0].effective_level(), 1);
        assert_eq!(refs[1].chapter_id, "test-s1-usage");
        assert_eq!(refs[1].effective_level(), 0);
    }

    #[test]
    fn test_outline() {
        let mut outline = Outline::new();
        let mut chapter1 = OutlineItem::new("Chapter 1", "ch1", 1);
        chapter1.add_child(OutlineItem::new("Section 1.1", "s11", 2));
        chapter1.add_child(OutlineItem::new("Section 1.2", "s12", 2));
        outline.add_item(chapter1);

        assert_eq!(outline.total_items(), 3);
    }
}
