//! Content repositories: named base locations fragments are loaded from.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// A declared content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    /// Identifier chapters refer to
    pub id: String,

    /// Absolute base location; always ends with `/`
    pub base_uri: Url,
}

impl Repo {
    /// Local file path of `relative` inside this repository.
    ///
    /// `relative` is a `/`-separated path taken literally, so characters such
    /// as `#`, `?` or `%` stay part of the file name.
    pub fn local_path(&self, relative: &str) -> Result<PathBuf> {
        let dir = self
            .base_uri
            .to_file_path()
            .map_err(|_| Error::NotFound(PathBuf::from(self.base_uri.as_str())))?;
        Ok(relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(dir, |path, segment| path.join(segment)))
    }
}

/// Registry of the repositories declared by one TOC document.
///
/// Repositories keep their declaration order. Re-declaring an id is ignored:
/// the first registration wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoRegistry {
    repos: Vec<Arc<Repo>>,
}

impl RepoRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a repository.
    ///
    /// `uri_path` is resolved against `base` when relative. The result must
    /// be absolute and must not point at a network authority.
    pub fn register(&mut self, id: &str, uri_path: &str, base: Option<&Url>) -> Result<Arc<Repo>> {
        if let Some(existing) = self.get(id) {
            log::warn!(
                "Repository '{}' declared more than once; keeping {}",
                id,
                existing.base_uri
            );
            return Ok(existing);
        }

        let base_uri = resolve_base(uri_path, base)?;
        let repo = Arc::new(Repo {
            id: id.to_string(),
            base_uri,
        });
        log::debug!("Registered repository '{}' at {}", repo.id, repo.base_uri);
        self.repos.push(repo.clone());
        Ok(repo)
    }

    /// Look up a repository by id.
    pub fn resolve(&self, id: &str) -> Result<Arc<Repo>> {
        self.get(id).ok_or_else(|| Error::Reference {
            kind: "repo",
            target: id.to_string(),
        })
    }

    /// Look up a repository by id, if declared.
    pub fn get(&self, id: &str) -> Option<Arc<Repo>> {
        self.repos.iter().find(|r| r.id == id).cloned()
    }

    /// Check whether an id has been declared.
    pub fn contains(&self, id: &str) -> bool {
        self.repos.iter().any(|r| r.id == id)
    }

    /// Number of declared repositories.
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    /// Check if no repositories were declared.
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Iterate repositories in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Repo>> {
        self.repos.iter()
    }
}

fn resolve_base(uri_path: &str, base: Option<&Url>) -> Result<Url> {
    let unresolved = || Error::Reference {
        kind: "repo uri",
        target: uri_path.to_string(),
    };

    let mut url = match Url::parse(uri_path) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(unresolved)?;
            base.join(uri_path).map_err(|_| unresolved())?
        }
        Err(_) => return Err(unresolved()),
    };

    if url.cannot_be_a_base() {
        return Err(unresolved());
    }

    let has_authority =
        url.host_str().is_some_and(|h| !h.is_empty()) || !url.username().is_empty();
    if has_authority {
        return Err(Error::Reference {
            kind: "repo uri (network location not allowed)",
            target: url.to_string(),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("file:///books/manual/").unwrap()
    }

    #[test]
    fn test_register_relative() {
        let mut registry = RepoRegistry::new();
        let repo = registry.register("main", "fragments", Some(&base())).unwrap();
        assert_eq!(repo.base_uri.as_str(), "file:///books/manual/fragments/");
        assert_eq!(
            repo.local_path("intro.html").unwrap(),
            PathBuf::from("/books/manual/fragments/intro.html")
        );
        assert_eq!(
            repo.local_path("faq/q#1?.html").unwrap(),
            PathBuf::from("/books/manual/fragments/faq/q#1?.html")
        );
    }

    #[test]
    fn test_register_absolute() {
        let mut registry = RepoRegistry::new();
        let repo = registry
            .register("shared", "file:///opt/shared/", Some(&base()))
            .unwrap();
        assert_eq!(repo.base_uri.as_str(), "file:///opt/shared/");
    }

    #[test]
    fn test_relative_without_base_is_rejected() {
        let mut registry = RepoRegistry::new();
        let err = registry.register("main", "fragments", None).unwrap_err();
        assert!(matches!(err, Error::Reference { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_network_authority_is_rejected() {
        let mut registry = RepoRegistry::new();
        let err = registry
            .register("remote", "http://example.com/docs/", Some(&base()))
            .unwrap_err();
        assert!(matches!(err, Error::Reference { .. }));
        assert!(!registry.contains("remote"));
    }

    #[test]
    fn test_duplicate_id_first_wins() {
        let mut registry = RepoRegistry::new();
        registry.register("main", "one", Some(&base())).unwrap();
        let second = registry.register("main", "two", Some(&base())).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(second.base_uri.as_str(), "file:///books/manual/one/");
        assert_eq!(
            registry.resolve("main").unwrap().base_uri.as_str(),
            "file:///books/manual/one/"
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = RepoRegistry::new();
        match registry.resolve("missing") {
            Err(Error::Reference { kind, target }) => {
                assert_eq!(kind, "repo");
                assert_eq!(target, "missing");
            }
            other => panic!("expected reference error, got {other:?}"),
        }
    }
}
