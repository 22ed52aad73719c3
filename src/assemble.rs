//! End-to-end assembly: parse, post-process, generate, check.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::check::{check_links, LinkWarning};
use crate::convert::{Converter, ConverterRegistry};
use crate::error::Result;
use crate::generate::{GeneratorRegistry, PseudoSectionGenerator};
use crate::model::Document;
use crate::parser::{ParseOptions, TocParser};
use crate::process::{Pipeline, PostProcessorFactory, PostProcessorRegistry};

/// A finished document and the link problems found in it.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub document: Document,
    pub warnings: Vec<LinkWarning>,
}

impl Assembly {
    /// Check if the link checker found nothing.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Assembles TOC documents with a fixed set of registries and options.
///
/// Registries are read-only once the assembler is built and are shared by
/// every document it processes.
///
/// # Example
///
/// ```no_run
/// use folio::{Assembler, ParseOptions};
///
/// let assembler = Assembler::with_options(ParseOptions::new().with_property("edition", "2"));
/// let assembly = assembler.assemble_file("docs/manual.xml")?;
/// for warning in &assembly.warnings {
///     eprintln!("{}", warning);
/// }
/// # Ok::<(), folio::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    converters: ConverterRegistry,
    processors: PostProcessorRegistry,
    generators: GeneratorRegistry,
    options: ParseOptions,
}

impl Assembler {
    /// Create an assembler with the built-in registries and default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler with the built-in registries and custom options.
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Register an additional markup converter.
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converters.register(converter);
        self
    }

    /// Register an additional post-processor.
    pub fn with_post_processor(
        mut self,
        name: impl Into<String>,
        factory: PostProcessorFactory,
    ) -> Self {
        self.processors.register(name, factory);
        self
    }

    /// Register an additional pseudo-section generator.
    pub fn with_generator(mut self, generator: Arc<dyn PseudoSectionGenerator>) -> Self {
        self.generators.register(generator);
        self
    }

    /// Parse options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Converter registry in use.
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// A TOC parser borrowing this assembler's registries.
    pub fn parser(&self) -> TocParser<'_> {
        TocParser::new(
            &self.converters,
            &self.processors,
            &self.generators,
            &self.options,
        )
    }

    /// Assemble the TOC file at `path`.
    pub fn assemble_file<P: AsRef<Path>>(&self, path: P) -> Result<Assembly> {
        let document = self.parser().parse_file(path)?;
        self.finish(document)
    }

    /// Assemble TOC source text named `name`.
    pub fn assemble_str(&self, source: &str, name: &str) -> Result<Assembly> {
        let document = self.parser().parse_str(source, name)?;
        self.finish(document)
    }

    /// Assemble several TOC files one after the other.
    ///
    /// A failing document does not stop the batch; each path gets its own
    /// result, in input order.
    pub fn assemble_batch<I, P>(&self, paths: I) -> Vec<(PathBuf, Result<Assembly>)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().to_path_buf();
                let result = self.assemble_file(&path);
                match &result {
                    Ok(assembly) => log::info!(
                        "Assembled {} ({} chapters, {} warnings)",
                        path.display(),
                        assembly.document.chapter_count(),
                        assembly.warnings.len()
                    ),
                    Err(e) => log::error!("Failed to assemble {}: {}", path.display(), e),
                }
                (path, result)
            })
            .collect()
    }

    /// Run the stages that follow parsing on a freshly parsed document.
    pub fn finish(&self, mut document: Document) -> Result<Assembly> {
        let name = document.toc_base_name.clone();
        let stages = |document: &mut Document| -> Result<()> {
            Pipeline::for_document(document, &self.processors)?.apply(document)?;
            self.generators.apply(document)
        };
        stages(&mut document).map_err(|e| e.in_document(name))?;

        let warnings = check_links(&document);
        Ok(Assembly { document, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::DocumentStage;
    use std::fs;
    use url::Url;

    #[test]
    fn test_assemble_str_runs_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("intro.html"),
            r##"<h1>Welcome</h1><a href="#nowhere">x</a>"##,
        )
        .unwrap();

        let assembler = Assembler::with_options(
            ParseOptions::new().with_base_url(Url::from_directory_path(dir.path()).unwrap()),
        );
        let toc = r#"<document><repos><repo id="r" uri="."/></repos>
            <psection title="Contents" classname="toc"/>
            <section title="Start" level="1"><chapters><chapter repo="r" fragment="intro" level="1"/></chapters></section>
            </document>"#;
        let assembly = assembler.assemble_str(toc, "book").unwrap();

        assert_eq!(assembly.document.stage, DocumentStage::Generated);
        let html = &assembly.document.content_sections().next().unwrap().chapters[0].html;
        assert!(html.starts_with(r#"<h1 id="book-start-intro-welcome">"#));
        let toc_body = assembly.document.sections[0]
            .as_generated()
            .unwrap()
            .body
            .as_deref()
            .unwrap();
        assert!(toc_body.contains("#book-start-intro-welcome"));
        assert_eq!(assembly.warnings.len(), 1);
        assert!(!assembly.is_clean());
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.xml");
        fs::write(&good, "<document/>").unwrap();
        let missing = dir.path().join("missing.xml");

        let results = Assembler::new().assemble_batch([&missing, &good]);
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].1.as_ref().err().map(Error::root),
            Some(Error::NotFound(_))
        ));
        assert!(results[1].1.is_ok());
    }
}
