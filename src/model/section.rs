//! Section variants of an assembled document.

use super::Chapter;
use crate::ids;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of a section, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Chapters loaded from fragments
    Content,
    /// Metadata elements only
    Meta,
    /// Generated body content (table of contents, ...)
    Pseudo,
    /// Generated document-head content (bookmarks, ...)
    Header,
}

/// A titled part of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Section {
    Content(ContentSection),
    Meta(MetaSection),
    Pseudo(GeneratedSection),
    Header(GeneratedSection),
}

impl Section {
    /// Section title.
    pub fn name(&self) -> &str {
        match self {
            Section::Content(s) => &s.name,
            Section::Meta(s) => &s.name,
            Section::Pseudo(s) | Section::Header(s) => &s.name,
        }
    }

    /// Whether the section is laid out rotated.
    pub fn rotated(&self) -> bool {
        match self {
            Section::Content(s) => s.rotated,
            Section::Meta(s) => s.rotated,
            Section::Pseudo(s) | Section::Header(s) => s.rotated,
        }
    }

    /// Kind of this section.
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Content(_) => SectionKind::Content,
            Section::Meta(_) => SectionKind::Meta,
            Section::Pseudo(_) => SectionKind::Pseudo,
            Section::Header(_) => SectionKind::Header,
        }
    }

    /// Anchor id of this section within the TOC named `toc_base_name`.
    pub fn id(&self, toc_base_name: &str) -> String {
        ids::section_id(toc_base_name, self.name())
    }

    /// Content payload, if this is a content section.
    pub fn as_content(&self) -> Option<&ContentSection> {
        match self {
            Section::Content(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable content payload, if this is a content section.
    pub fn as_content_mut(&mut self) -> Option<&mut ContentSection> {
        match self {
            Section::Content(s) => Some(s),
            _ => None,
        }
    }

    /// Generated payload, if this is a pseudo or header section.
    pub fn as_generated(&self) -> Option<&GeneratedSection> {
        match self {
            Section::Pseudo(s) | Section::Header(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable generated payload, if this is a pseudo or header section.
    pub fn as_generated_mut(&mut self) -> Option<&mut GeneratedSection> {
        match self {
            Section::Pseudo(s) | Section::Header(s) => Some(s),
            _ => None,
        }
    }

    /// Metadata elements, for sections that carry them.
    pub fn elements(&self) -> Option<&[(String, String)]> {
        match self {
            Section::Content(s) => Some(&s.elements),
            Section::Meta(s) => Some(&s.elements),
            _ => None,
        }
    }

    /// Append a metadata element, for sections that carry them.
    ///
    /// Returns `false` if the section kind has no element list.
    pub fn push_element(&mut self, key: String, value: String) -> bool {
        match self {
            Section::Content(s) => s.elements.push((key, value)),
            Section::Meta(s) => s.elements.push((key, value)),
            _ => return false,
        }
        true
    }
}

/// A section holding chapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSection {
    pub name: String,
    pub rotated: bool,

    /// Section level used in the effective-level computation
    pub level: i32,

    /// Chapters in TOC order
    pub chapters: Vec<Chapter>,

    /// `(key, value)` pairs pulled from document metadata
    pub elements: Vec<(String, String)>,
}

impl ContentSection {
    /// Create an empty content section.
    pub fn new(name: impl Into<String>, level: i32) -> Self {
        Self {
            name: name.into(),
            rotated: false,
            level,
            chapters: Vec::new(),
            elements: Vec::new(),
        }
    }
}

/// A section holding metadata elements only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaSection {
    pub name: String,
    pub rotated: bool,
    pub elements: Vec<(String, String)>,
}

impl MetaSection {
    /// Create an empty meta section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotated: false,
            elements: Vec::new(),
        }
    }
}

/// A section whose body is produced by a named generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub name: String,
    pub rotated: bool,

    /// Registry key of the generator
    pub generator: String,

    /// Generator-specific attributes from the TOC
    pub config: IndexMap<String, String>,

    /// Generated body; filled once, after post-processing
    pub body: Option<String>,
}

impl GeneratedSection {
    /// Create a generated section bound to `generator`.
    pub fn new(name: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotated: false,
            generator: generator.into(),
            config: IndexMap::new(),
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_accessors() {
        let mut section = Section::Content(ContentSection::new("Getting Started", 2));
        assert_eq!(section.kind(), SectionKind::Content);
        assert_eq!(section.name(), "Getting Started");
        assert_eq!(section.id("manual"), "manual-getting-started");
        assert!(section.push_element("author".into(), "Jane".into()));
        assert_eq!(section.elements().unwrap().len(), 1);
    }

    #[test]
    fn test_generated_sections_have_no_elements() {
        let mut section = Section::Pseudo(GeneratedSection::new("Contents", "toc"));
        assert!(!section.push_element("k".into(), "v".into()));
        assert!(section.elements().is_none());
        assert!(section.as_generated().unwrap().body.is_none());
    }
}
