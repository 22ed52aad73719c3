//! TOC parsing module.

mod options;
mod properties;
mod toc_parser;

pub use options::{ParseOptions, DEFAULT_FRAGMENT_EXTENSION};
pub use properties::{load_properties, parse_properties};
pub use toc_parser::{TocParser, ROOT_ELEMENT, VERSION_KEY};
