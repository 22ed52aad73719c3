//! Output of the finished model.
//!
//! Final rendering (HTML pages, PDF) happens outside this crate. A
//! [`Renderer`] turns an assembled [`Document`] into bytes for such a tool;
//! the built-in [`JsonRenderer`] serializes the whole model.

mod json;

pub use json::{to_json, JsonFormat, JsonRenderer};

use crate::error::Result;
use crate::model::Document;

/// Trait for consumers of an assembled document.
pub trait Renderer: Send + Sync {
    /// Short identifier (for logs and CLI output).
    fn name(&self) -> &str;

    /// File extension of the produced output, without the dot.
    fn extension(&self) -> &str;

    /// Render a finished document.
    fn render(&self, doc: &Document) -> Result<Vec<u8>>;
}
