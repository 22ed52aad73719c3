//! Pseudo-section generators.
//!
//! Generators derive content (a table of contents, PDF bookmarks) from the
//! finished document. They run after post-processing, when every heading
//! carries its final level and id, and their output becomes the body of the
//! pseudo or header section that requested them.

mod bookmarks;
mod toc;

pub use bookmarks::BookmarkGenerator;
pub use toc::TocGenerator;

use crate::error::{Error, Result};
use crate::html::{self, HEADING};
use crate::model::{Document, DocumentStage, Section};
use indexmap::IndexMap;
use std::sync::Arc;

/// `maxlevel` used when a generator section does not set one.
pub const DEFAULT_MAX_LEVEL: i32 = 3;

/// Generator-specific attributes from the TOC.
pub type GeneratorConfig = IndexMap<String, String>;

/// Trait for pseudo-section generators.
pub trait PseudoSectionGenerator: Send + Sync {
    /// Registry key of this generator.
    fn name(&self) -> &str;

    /// Produce the section body from a fully post-processed document.
    fn generate(&self, doc: &Document, config: &GeneratorConfig) -> Result<String>;
}

/// Registry mapping stable generator names to implementations.
#[derive(Clone)]
pub struct GeneratorRegistry {
    generators: IndexMap<String, Arc<dyn PseudoSectionGenerator>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            generators: IndexMap::new(),
        }
    }

    /// Create a registry with the built-in generators (`toc`, `bookmarks`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TocGenerator));
        registry.register(Arc::new(BookmarkGenerator));
        registry
    }

    /// Register a generator under its name.
    pub fn register(&mut self, generator: Arc<dyn PseudoSectionGenerator>) {
        self.generators
            .insert(generator.name().to_string(), generator);
    }

    /// Check if a generator name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Get a generator by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn PseudoSectionGenerator>> {
        self.generators
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Configuration(format!("Unknown section generator: {}", name)))
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    /// Fill every pseudo and header section of a post-processed document.
    ///
    /// Each body is generated from the document as it stood before any
    /// generated section was filled, and inserted exactly once.
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        if doc.stage != DocumentStage::Processed {
            return Err(Error::Lifecycle(format!(
                "section generation requires a post-processed document, found stage {:?}",
                doc.stage
            )));
        }

        let mut header_bodies = Vec::new();
        for section in &doc.header_sections {
            header_bodies.push(self.generate_section(doc, section)?);
        }
        let mut bodies = Vec::new();
        for section in &doc.sections {
            bodies.push(self.generate_section(doc, section)?);
        }

        let sections = doc.header_sections.iter_mut().chain(doc.sections.iter_mut());
        for (section, body) in sections.zip(header_bodies.into_iter().chain(bodies)) {
            if let (Some(generated), Some(body)) = (section.as_generated_mut(), body) {
                generated.body = Some(body);
            }
        }

        doc.stage = DocumentStage::Generated;
        Ok(())
    }

    fn generate_section(&self, doc: &Document, section: &Section) -> Result<Option<String>> {
        let Some(generated) = section.as_generated() else {
            return Ok(None);
        };
        if generated.body.is_some() {
            return Err(Error::Lifecycle(format!(
                "section '{}' was already generated",
                generated.name
            )));
        }
        let generator = self.get(&generated.generator)?;
        log::debug!(
            "Generating section '{}' with '{}'",
            generated.name,
            generator.name()
        );
        generator.generate(doc, &generated.config).map(Some)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Read the `maxlevel` attribute of a generator section.
pub fn max_level(config: &GeneratorConfig) -> Result<i32> {
    match config.get("maxlevel") {
        None => Ok(DEFAULT_MAX_LEVEL),
        Some(value) => value.trim().parse().map_err(|_| {
            Error::validation("psection", "maxlevel", format!("not an integer: '{}'", value))
        }),
    }
}

/// A linkable heading found in final chapter HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingEntry {
    pub text: String,
    pub id: String,
    pub level: i32,
}

/// A content section and the headings it contributes to an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub title: String,
    pub id: String,
    pub level: i32,
    pub headings: Vec<HeadingEntry>,
}

/// Collect the outline of a post-processed document.
///
/// A content section qualifies when its level is at most `max_level`; within
/// qualifying sections, every heading with an id whose final level is at
/// most `max_level` is included. Non-qualifying sections contribute nothing.
pub fn collect_outline(doc: &Document, max_level: i32) -> Vec<SectionEntry> {
    let mut entries = Vec::new();

    for section in &doc.sections {
        let Some(content) = section.as_content() else {
            continue;
        };
        if content.level > max_level {
            continue;
        }

        let section_id = doc.section_id(section);
        let mut headings = Vec::new();
        for chapter in &content.chapters {
            for caps in HEADING.captures_iter(&chapter.html) {
                let Ok(level) = caps[1].parse::<i32>() else {
                    continue;
                };
                if level > max_level {
                    continue;
                }
                let Some(id) = html::id_attribute(&caps[2]) else {
                    continue;
                };
                headings.push(HeadingEntry {
                    text: html::heading_text(&caps[3]),
                    id: id.to_string(),
                    level,
                });
            }
        }

        entries.push(SectionEntry {
            title: content.name.clone(),
            id: section_id,
            level: content.level,
            headings,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, ContentSection, GeneratedSection, Repo};
    use url::Url;

    pub(crate) fn processed_document() -> Document {
        let repo = Arc::new(Repo {
            id: "main".into(),
            base_uri: Url::parse("file:///repo/").unwrap(),
        });

        let mut intro = ContentSection::new("Intro", 1);
        intro.chapters.push(Chapter::new(
            "a",
            repo.clone(),
            r#"<h1 id="doc-intro-a-welcome">Welcome</h1><h2 id="doc-intro-a-details">Details</h2><h4 id="doc-intro-a-deep">Deep</h4>"#,
        ));
        let mut reference = ContentSection::new("Reference", 2);
        reference.chapters.push(Chapter::new(
            "b",
            repo,
            r#"<h2 id="doc-reference-b-api">API &amp; CLI</h2><h3>No id</h3>"#,
        ));

        let mut doc = Document::new("doc");
        doc.sections
            .push(Section::Pseudo(GeneratedSection::new("Contents", "toc")));
        doc.sections.push(Section::Content(intro));
        doc.sections.push(Section::Content(reference));
        doc.stage = DocumentStage::Processed;
        doc
    }

    #[test]
    fn test_collect_outline() {
        let doc = processed_document();
        let outline = collect_outline(&doc, 3);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].id, "doc-intro");
        assert_eq!(
            outline[0]
                .headings
                .iter()
                .map(|h| h.id.as_str())
                .collect::<Vec<_>>(),
            vec!["doc-intro-a-welcome", "doc-intro-a-details"]
        );
        assert_eq!(outline[1].headings.len(), 1);
        assert_eq!(outline[1].headings[0].text, "API & CLI");
    }

    #[test]
    fn test_max_level_one_excludes_deeper_sections() {
        let doc = processed_document();
        let outline = collect_outline(&doc, 1);
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "Intro");
        assert_eq!(outline[0].headings.len(), 1);
    }

    #[test]
    fn test_max_level_config() {
        let mut config = GeneratorConfig::new();
        assert_eq!(max_level(&config).unwrap(), DEFAULT_MAX_LEVEL);
        config.insert("maxlevel".into(), " 2 ".into());
        assert_eq!(max_level(&config).unwrap(), 2);
        config.insert("maxlevel".into(), "deep".into());
        assert!(matches!(
            max_level(&config),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_apply_fills_once() {
        let mut doc = processed_document();
        let registry = GeneratorRegistry::with_defaults();
        registry.apply(&mut doc).unwrap();

        let body = doc.sections[0].as_generated().unwrap().body.clone().unwrap();
        assert!(body.contains(r##"href="#doc-intro""##));
        assert_eq!(doc.stage, DocumentStage::Generated);

        let err = registry.apply(&mut doc).unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
    }

    #[test]
    fn test_apply_requires_processed_document() {
        let mut doc = processed_document();
        doc.stage = DocumentStage::Parsed;
        let err = GeneratorRegistry::with_defaults().apply(&mut doc).unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
    }

    #[test]
    fn test_unknown_generator() {
        let registry = GeneratorRegistry::new();
        assert!(matches!(registry.get("toc"), Err(Error::Configuration(_))));
    }
}
