//! Fragment converter module providing a plugin architecture for markup formats.
//!
//! Converters turn raw fragment bytes into HTML. They are registered by file
//! extension, and the [`FragmentResolver`] picks one for each chapter based
//! on the fragment name.
//!
//! # Example
//!
//! ```
//! use folio::convert::{ConvertContext, Converter, ConverterRegistry};
//! use std::sync::Arc;
//!
//! struct Shout;
//!
//! impl Converter for Shout {
//!     fn supported_extensions(&self) -> &[&str] {
//!         &["shout"]
//!     }
//!
//!     fn name(&self) -> &str {
//!         "shout"
//!     }
//!
//!     fn convert(
//!         &self,
//!         raw: &[u8],
//!         _config: Option<&str>,
//!         _ctx: &ConvertContext<'_>,
//!     ) -> folio::Result<String> {
//!         Ok(format!("<p>{}</p>", String::from_utf8_lossy(raw).to_uppercase()))
//!     }
//! }
//!
//! let mut registry = ConverterRegistry::with_defaults();
//! registry.register(Arc::new(Shout));
//! assert!(registry.supports("shout"));
//! assert!(registry.supports("html"));
//! ```

mod fragment;
mod html;

pub use fragment::FragmentResolver;
pub use html::{HtmlConverter, TextConverter};

use crate::error::Result;
use crate::model::{Metadata, Repo};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Document state visible to a converter.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    /// Metadata collected so far from the TOC
    pub metadata: &'a Metadata,

    /// Repository the fragment belongs to
    pub repo: &'a Repo,

    /// Local path of the fragment file
    pub path: &'a Path,
}

/// Trait for markup converters.
///
/// Implement this trait to add support for a new fragment format.
pub trait Converter: Send + Sync {
    /// Get the supported file extensions for this converter.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["md"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert raw fragment content to HTML.
    ///
    /// `config` is the opaque `config` attribute of the chapter. The resolver
    /// reports failures together with the fragment path.
    fn convert(
        &self,
        raw: &[u8],
        config: Option<&str>,
        ctx: &ConvertContext<'_>,
    ) -> Result<String>;

    /// Check if this converter supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for fragment converters.
///
/// The registry maps file extensions to converters. It is read-only once
/// built and can be shared across documents.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
    by_name: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the built-in converters (HTML, plain text).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlConverter::new()));
        registry.register(Arc::new(TextConverter::new()));
        registry
    }

    /// Register a converter.
    ///
    /// The converter will be registered for all its supported extensions,
    /// replacing any converter previously registered for them.
    pub fn register(&mut self, converter: Arc<dyn Converter>) {
        for ext in converter.supported_extensions() {
            self.converters
                .insert(ext.to_lowercase(), converter.clone());
        }
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn Converter>> {
        self.converters.get(&ext.to_lowercase()).cloned()
    }

    /// Get a converter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.converters.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.converters.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("extensions", &self.supported_extensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.supports("html"));
        assert!(registry.supports("HTML"));
        assert!(registry.supports("txt"));
        assert!(!registry.supports("md"));
    }

    #[test]
    fn test_registry_get_by_extension() {
        let registry = ConverterRegistry::with_defaults();
        let converter = registry.get_by_extension("htm");
        assert!(converter.is_some());
        assert_eq!(converter.unwrap().name(), "html");
    }

    #[test]
    fn test_registry_get_by_name() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.get_by_name("text").is_some());
        assert!(registry.get_by_name("TEXT").is_some());
        assert!(registry.get_by_name("markdown").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ConverterRegistry::new();
        assert!(registry.supported_extensions().is_empty());
    }
}
