//! Post-processing pipeline applied to every chapter's HTML.
//!
//! Once the whole document tree exists, each chapter's converted HTML runs
//! through an ordered list of [`PostProcessor`]s. Each filter is a pure
//! function of the chapter context and its input text; the output of one
//! feeds the next.
//!
//! The default order is:
//!
//! 1. `header-level-increment`
//! 2. `header-id-injection`
//! 3. `image-href-resolution`
//! 4. `key-value-substitution`
//!
//! Filters requested by the TOC (`<postprocessor classname=...>`) run after
//! the defaults, in declaration order.

mod filters;

pub use filters::{
    HeaderIdInjection, HeaderLevelIncrement, ImageHrefResolution, KeyValueSubstitution,
    LinkHrefResolution, MAX_SUBSTITUTION_GROWTH, MAX_SUBSTITUTION_PASSES,
};

use crate::error::{Error, Result};
use crate::model::{ContentSection, Document, DocumentStage, Metadata};
use indexmap::IndexMap;
use url::Url;

/// Chapter state visible to a post-processor.
#[derive(Debug, Clone, Copy)]
pub struct ChapterContext<'a> {
    /// Heading shift for this chapter
    pub effective_level: i32,

    /// Anchor id of the chapter
    pub chapter_id: &'a str,

    /// Anchor id of the owning section
    pub section_id: &'a str,

    /// Owning section
    pub section: &'a ContentSection,

    /// Document metadata
    pub metadata: &'a Metadata,

    /// Base URI of the chapter's repository
    pub repo_base: &'a Url,
}

/// A rewrite filter over chapter HTML.
pub trait PostProcessor: Send + Sync {
    /// Registry key of this filter.
    fn name(&self) -> &str;

    /// Rewrite `html`, preserving everything the filter does not match.
    fn process(&self, ctx: &ChapterContext<'_>, html: &str) -> String;
}

/// Filter-specific attributes from the TOC.
pub type FilterConfig = IndexMap<String, String>;

/// Builds a filter from its TOC attributes.
pub type PostProcessorFactory = fn(&FilterConfig) -> Result<Box<dyn PostProcessor>>;

/// Names of the filters every pipeline starts with, in order.
pub const DEFAULT_FILTERS: [&str; 4] = [
    HeaderLevelIncrement::NAME,
    HeaderIdInjection::NAME,
    ImageHrefResolution::NAME,
    KeyValueSubstitution::NAME,
];

/// Registry mapping stable filter names to constructors.
#[derive(Clone)]
pub struct PostProcessorRegistry {
    factories: IndexMap<String, PostProcessorFactory>,
}

impl PostProcessorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Create a registry with the built-in filters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(HeaderLevelIncrement::NAME, HeaderLevelIncrement::factory);
        registry.register(HeaderIdInjection::NAME, HeaderIdInjection::factory);
        registry.register(ImageHrefResolution::NAME, ImageHrefResolution::factory);
        registry.register(KeyValueSubstitution::NAME, KeyValueSubstitution::factory);
        registry.register(LinkHrefResolution::NAME, LinkHrefResolution::factory);
        registry
    }

    /// Register a filter constructor under `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: PostProcessorFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Check if a filter name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the filter registered under `name`.
    pub fn create(&self, name: &str, config: &FilterConfig) -> Result<Box<dyn PostProcessor>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("Unknown post-processor: {}", name)))?;
        factory(config)
    }
}

impl Default for PostProcessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for PostProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Ordered chain of post-processors.
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn PostProcessor>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with the default filters.
    pub fn standard() -> Self {
        Self::new()
            .with_processor(HeaderLevelIncrement)
            .with_processor(HeaderIdInjection)
            .with_processor(ImageHrefResolution)
            .with_processor(KeyValueSubstitution)
    }

    /// Build the pipeline for a document: the defaults, then every filter
    /// the TOC requested.
    pub fn for_document(doc: &Document, registry: &PostProcessorRegistry) -> Result<Self> {
        let mut pipeline = Self::new();
        for name in DEFAULT_FILTERS {
            pipeline.push(registry.create(name, &FilterConfig::new())?);
        }
        for (name, config) in &doc.post_processors {
            pipeline.push(registry.create(name, config)?);
        }
        Ok(pipeline)
    }

    /// Append a filter.
    pub fn with_processor<P: PostProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Append a boxed filter.
    pub fn push(&mut self, processor: Box<dyn PostProcessor>) {
        self.processors.push(processor);
    }

    /// Filter names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Run every filter over one chapter's HTML.
    pub fn run(&self, ctx: &ChapterContext<'_>, html: &str) -> String {
        self.processors
            .iter()
            .fold(html.to_string(), |acc, processor| processor.process(ctx, &acc))
    }

    /// Rewrite every chapter of a freshly parsed document.
    ///
    /// Chapter HTML is rewritten exactly once; running the pipeline on a
    /// document that already went through it is an error.
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        if doc.stage != DocumentStage::Parsed {
            return Err(Error::Lifecycle(format!(
                "post-processing requires a parsed document, found stage {:?}",
                doc.stage
            )));
        }

        let rewritten: Vec<String> = doc
            .chapters()
            .map(|chapter_ref| {
                let ctx = ChapterContext {
                    effective_level: chapter_ref.effective_level(),
                    chapter_id: &chapter_ref.chapter_id,
                    section_id: &chapter_ref.section_id,
                    section: chapter_ref.section,
                    metadata: &doc.metadata,
                    repo_base: &chapter_ref.chapter.repo.base_uri,
                };
                log::debug!("Post-processing chapter {}", chapter_ref.chapter_id);
                self.run(&ctx, &chapter_ref.chapter.html)
            })
            .collect();

        let chapters = doc
            .sections
            .iter_mut()
            .filter_map(|s| s.as_content_mut())
            .flat_map(|s| s.chapters.iter_mut());
        for (chapter, html) in chapters.zip(rewritten) {
            chapter.html = html;
        }

        doc.stage = DocumentStage::Processed;
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, Repo, Section};
    use std::sync::Arc;

    fn document() -> Document {
        let repo = Arc::new(Repo {
            id: "main".into(),
            base_uri: Url::parse("file:///repo/").unwrap(),
        });
        let mut section = ContentSection::new("S1", 2);
        section.chapters.push(
            Chapter::new("intro", repo, "<h1>Header</h1><p>${home}</p>").with_level_offset(1),
        );
        let mut doc = Document::new("test");
        doc.metadata.insert("home".into(), "London".into());
        doc.sections.push(Section::Content(section));
        doc
    }

    #[test]
    fn test_standard_order() {
        let pipeline = Pipeline::standard();
        assert_eq!(pipeline.names(), DEFAULT_FILTERS.to_vec());
    }

    #[test]
    fn test_apply_rewrites_once() {
        let mut doc = document();
        let pipeline = Pipeline::standard();
        pipeline.apply(&mut doc).unwrap();

        let html = &doc.content_sections().next().unwrap().chapters[0].html;
        assert_eq!(html, r#"<h2 id="test-s1-intro-header">Header</h2><p>London</p>"#);
        assert_eq!(doc.stage, DocumentStage::Processed);

        let err = pipeline.apply(&mut doc).unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
    }

    #[test]
    fn test_for_document_appends_requested_filters() {
        let mut doc = document();
        doc.post_processors
            .push((LinkHrefResolution::NAME.to_string(), FilterConfig::new()));
        let pipeline = Pipeline::for_document(&doc, &PostProcessorRegistry::default()).unwrap();
        assert_eq!(pipeline.names().len(), 5);
        assert_eq!(pipeline.names()[4], LinkHrefResolution::NAME);
    }

    #[test]
    fn test_registry_rejects_unknown() {
        let registry = PostProcessorRegistry::with_defaults();
        assert!(registry.contains("header-id-injection"));
        let err = registry
            .create("com.example.Missing", &FilterConfig::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
