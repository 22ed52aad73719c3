//! Loading and converting chapter fragments.

use crate::error::{Error, Result};
use crate::model::{Metadata, Repo};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ConvertContext, ConverterRegistry};

/// Resolves a fragment name inside a repository to converted HTML.
#[derive(Debug, Clone, Copy)]
pub struct FragmentResolver<'a> {
    converters: &'a ConverterRegistry,
    default_extension: &'a str,
}

impl<'a> FragmentResolver<'a> {
    /// Create a resolver over `converters`.
    ///
    /// `default_extension` is used for fragment names without a suffix.
    pub fn new(converters: &'a ConverterRegistry, default_extension: &'a str) -> Self {
        Self {
            converters,
            default_extension: default_extension.trim_start_matches('.'),
        }
    }

    /// Extension and file name a fragment name resolves to.
    pub fn file_name(&self, fragment_name: &str) -> (String, String) {
        match Path::new(fragment_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => (ext.to_lowercase(), fragment_name.to_string()),
            None => (
                self.default_extension.to_lowercase(),
                format!("{}.{}", fragment_name, self.default_extension),
            ),
        }
    }

    /// Local path of a fragment inside `repo`.
    pub fn locate(&self, repo: &Repo, fragment_name: &str) -> Result<PathBuf> {
        let (_, file_name) = self.file_name(fragment_name);
        repo.local_path(&file_name)
    }

    /// Load a fragment and convert it to HTML.
    pub fn resolve(
        &self,
        repo: &Repo,
        fragment_name: &str,
        config: Option<&str>,
        metadata: &Metadata,
    ) -> Result<String> {
        let (ext, _) = self.file_name(fragment_name);
        let converter = self.converters.get_by_extension(&ext).ok_or_else(|| {
            Error::Configuration(format!(
                "No converter for extension '{}' (fragment '{}')",
                ext, fragment_name
            ))
        })?;

        let path = self.locate(repo, fragment_name)?;
        let raw = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.clone()),
            _ => Error::Io(e),
        })?;

        log::debug!(
            "Converting {} with '{}' converter ({} bytes)",
            path.display(),
            converter.name(),
            raw.len()
        );

        let ctx = ConvertContext {
            metadata,
            repo,
            path: &path,
        };
        converter
            .convert(&raw, config, &ctx)
            .map_err(|e| match e {
                Error::Conversion { .. } => e,
                other => Error::Conversion {
                    path: path.clone(),
                    message: other.to_string(),
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use url::Url;

    fn repo_in(dir: &TempDir) -> Repo {
        Repo {
            id: "main".into(),
            base_uri: Url::from_directory_path(dir.path()).unwrap(),
        }
    }

    #[test]
    fn test_file_name_uses_suffix_or_default() {
        let registry = ConverterRegistry::with_defaults();
        let resolver = FragmentResolver::new(&registry, "html");
        assert_eq!(
            resolver.file_name("notes.TXT"),
            ("txt".to_string(), "notes.TXT".to_string())
        );
        assert_eq!(
            resolver.file_name("intro"),
            ("html".to_string(), "intro.html".to_string())
        );
    }

    #[test]
    fn test_resolve_default_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("intro.html"), "<h1>Intro</h1>").unwrap();

        let registry = ConverterRegistry::with_defaults();
        let resolver = FragmentResolver::new(&registry, ".html");
        let html = resolver
            .resolve(&repo_in(&dir), "intro", None, &Metadata::new())
            .unwrap();
        assert_eq!(html, "<h1>Intro</h1>");
    }

    #[test]
    fn test_resolve_name_with_url_delimiters() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("faq#1.html"), "<p>first</p>").unwrap();
        fs::write(dir.path().join("faq"), "wrong file").unwrap();

        let registry = ConverterRegistry::with_defaults();
        let resolver = FragmentResolver::new(&registry, "html");
        let repo = repo_in(&dir);
        assert_eq!(
            resolver.locate(&repo, "faq#1.html").unwrap(),
            dir.path().join("faq#1.html")
        );
        let html = resolver
            .resolve(&repo, "faq#1.html", None, &Metadata::new())
            .unwrap();
        assert_eq!(html, "<p>first</p>");
    }

    #[test]
    fn test_resolve_missing_converter() {
        let dir = TempDir::new().unwrap();
        let registry = ConverterRegistry::with_defaults();
        let resolver = FragmentResolver::new(&registry, "html");
        let err = resolver
            .resolve(&repo_in(&dir), "intro.md", None, &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = TempDir::new().unwrap();
        let registry = ConverterRegistry::with_defaults();
        let resolver = FragmentResolver::new(&registry, "html");
        let err = resolver
            .resolve(&repo_in(&dir), "absent", None, &Metadata::new())
            .unwrap_err();
        match err {
            Error::NotFound(path) => assert!(path.ends_with("absent.html")),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
