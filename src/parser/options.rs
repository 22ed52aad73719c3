//! Parsing options and configuration.

use crate::model::Metadata;
use url::Url;

/// Extension assumed for fragment names without a suffix.
pub const DEFAULT_FRAGMENT_EXTENSION: &str = "html";

/// Options for parsing TOC documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Extension used for fragment names without a suffix
    pub default_extension: String,

    /// Base URI relative repo and property paths resolve against.
    ///
    /// When parsing a file and this is unset, the file's directory is used.
    pub base_url: Option<Url>,

    /// Overrides the TOC base name (otherwise the file stem)
    pub toc_base_name: Option<String>,

    /// Metadata present before the TOC is read; TOC properties override it
    pub metadata: Metadata,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default fragment extension.
    pub fn with_default_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.default_extension = ext.trim_start_matches('.').to_string();
        self
    }

    /// Set the document base URI.
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Override the TOC base name.
    pub fn with_toc_base_name(mut self, name: impl Into<String>) -> Self {
        self.toc_base_name = Some(name.into());
        self
    }

    /// Seed a metadata entry.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Seed metadata from `(key, value)` pairs.
    pub fn with_properties<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.metadata.insert(key.into(), value.into());
        }
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_extension: DEFAULT_FRAGMENT_EXTENSION.to_string(),
            base_url: None,
            toc_base_name: None,
            metadata: Metadata::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_default_extension(".md")
            .with_toc_base_name("manual")
            .with_property("version", "1.0")
            .with_properties([("home", "London")]);

        assert_eq!(options.default_extension, "md");
        assert_eq!(options.toc_base_name.as_deref(), Some("manual"));
        assert_eq!(options.metadata.len(), 2);
        assert_eq!(options.metadata.get_index(0).unwrap().0, "version");
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.default_extension, "html");
        assert!(options.base_url.is_none());
        assert!(options.metadata.is_empty());
    }
}
