//! # folio
//!
//! Document assembly engine for multi-fragment books and manuals.
//!
//! A declarative table-of-contents (TOC) file names the sections of a
//! document and the fragment files, stored in named repositories, that make up
//! each section. This library parses the TOC into a section/chapter tree,
//! converts every fragment to HTML, normalizes headings and links across
//! fragments, derives generated sections (table of contents, bookmarks) and
//! checks internal links. The result is a document model ready for an
//! external renderer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{assemble_file, render};
//!
//! fn main() -> folio::Result<()> {
//!     // Parse, post-process, generate and check
//!     let assembly = assemble_file("docs/manual.xml")?;
//!     for warning in &assembly.warnings {
//!         eprintln!("{}", warning);
//!     }
//!
//!     // Hand the model to an external renderer
//!     let json = render::to_json(&assembly.document, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - **Parse**: [`TocParser`] builds the tree, loading each chapter through a
//!   [`convert::Converter`] chosen by file extension
//! - **Post-process**: [`process::Pipeline`] rewrites every chapter once
//!   (heading levels, heading ids, image paths, `${key}` substitution)
//! - **Generate**: [`GeneratorRegistry`] fills pseudo and header sections
//! - **Check**: [`check_links`] reports dangling `#anchor` links

pub mod assemble;
pub mod check;
pub mod convert;
pub mod error;
pub mod generate;
pub(crate) mod html;
pub mod ids;
pub mod model;
pub mod parser;
pub mod process;
pub mod render;

// Re-export commonly used types
pub use assemble::{Assembler, Assembly};
pub use check::{check_links, LinkWarning};
pub use convert::{ConvertContext, Converter, ConverterRegistry, FragmentResolver};
pub use error::{Error, Result};
pub use generate::{GeneratorRegistry, PseudoSectionGenerator};
pub use model::{
    Chapter, ContentSection, Document, DocumentStage, GeneratedSection, Metadata, MetaSection,
    Repo, RepoRegistry, Section, SectionKind,
};
pub use parser::{ParseOptions, TocParser};
pub use process::{ChapterContext, Pipeline, PostProcessor, PostProcessorRegistry};
pub use render::{JsonFormat, JsonRenderer, Renderer};

use std::path::Path;

/// Assemble a TOC file with the built-in registries.
///
/// # Arguments
///
/// * `path` - Path to the TOC file
///
/// # Example
///
/// ```no_run
/// use folio::assemble_file;
///
/// let assembly = assemble_file("docs/manual.xml").unwrap();
/// println!("Chapters: {}", assembly.document.chapter_count());
/// ```
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Assembly> {
    Assembler::new().assemble_file(path)
}

/// Assemble a TOC file with custom parse options.
///
/// # Example
///
/// ```no_run
/// use folio::{assemble_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new()
///     .with_default_extension("txt")
///     .with_property("edition", "2");
/// let assembly = assemble_file_with_options("docs/manual.xml", options).unwrap();
/// ```
pub fn assemble_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<Assembly> {
    Assembler::with_options(options).assemble_file(path)
}

/// Parse a TOC file without running the later stages.
///
/// The returned document is in [`DocumentStage::Parsed`]; chapter HTML is
/// exactly what the converters produced.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Assembler::new().parser().parse_file(path)
}

/// Convert a TOC file to JSON after full assembly.
///
/// # Example
///
/// ```no_run
/// use folio::{to_json, JsonFormat};
///
/// let json = to_json("docs/manual.xml", JsonFormat::Pretty).unwrap();
/// std::fs::write("manual.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let assembly = assemble_file(path)?;
    render::to_json(&assembly.document, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_toc_file() {
        let err = assemble_file("/nonexistent/manual.xml").unwrap_err();
        assert!(matches!(err.root(), Error::NotFound(_)));
        assert!(err.to_string().starts_with("manual:"));
    }
}
