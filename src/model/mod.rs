//! Document model types for assembled content.
//!
//! The model is built by the TOC parser, rewritten once by the
//! post-processing pipeline, completed by the pseudo-section generators and
//! then handed to an external renderer.

mod chapter;
mod document;
mod repo;
mod section;

pub use chapter::Chapter;
pub use document::{
    ChapterRef, Document, DocumentStage, HeadAttributes, Metadata, Outline, OutlineItem,
};
pub use repo::{Repo, RepoRegistry};
pub use section::{ContentSection, GeneratedSection, MetaSection, Section, SectionKind};
