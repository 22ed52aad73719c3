//! Link integrity check over a finished document.
//!
//! Collects every anchor id the document defines (sections, chapters and any
//! `id` attribute in chapter HTML) and reports same-document links that point
//! nowhere. Findings are warnings; they never fail an assembly.

use crate::html;
use crate::model::Document;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

static LOCAL_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"(?i)<a\b[^>]*?\shref\s*=\s*(?:"#([^"]*)"|'#([^']*)')"##).unwrap()
});

/// A problem found by [`check_links`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkWarning {
    /// A `#target` link whose target id does not exist
    Dangling {
        section: String,
        chapter: String,
        target: String,
    },

    /// A section or chapter id produced more than once
    DuplicateId { id: String },
}

impl fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkWarning::Dangling {
                section,
                chapter,
                target,
            } => write!(
                f,
                "Dangling link to '#{}' in chapter '{}' of section '{}'",
                target, chapter, section
            ),
            LinkWarning::DuplicateId { id } => write!(f, "Duplicate anchor id '{}'", id),
        }
    }
}

/// Check every same-document link in the document.
pub fn check_links(doc: &Document) -> Vec<LinkWarning> {
    let mut warnings = Vec::new();
    let mut ids: HashSet<String> = HashSet::new();
    let mut structural = HashSet::new();

    let mut declare = |id: String, warnings: &mut Vec<LinkWarning>| {
        if !structural.insert(id.clone()) {
            warnings.push(LinkWarning::DuplicateId { id: id.clone() });
        }
        ids.insert(id);
    };

    for section in doc.all_sections() {
        declare(doc.section_id(section), &mut warnings);
    }
    for chapter in doc.chapters() {
        declare(chapter.chapter_id.clone(), &mut warnings);
    }
    for chapter in doc.chapters() {
        ids.extend(html::all_ids(&chapter.chapter.html).map(str::to_string));
    }

    for chapter in doc.chapters() {
        for caps in LOCAL_HREF.captures_iter(&chapter.chapter.html) {
            let target = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            if target.is_empty() || ids.contains(target) {
                continue;
            }
            warnings.push(LinkWarning::Dangling {
                section: chapter.section.name.clone(),
                chapter: chapter.chapter.fragment_name.clone(),
                target: target.to_string(),
            });
        }
    }

    for warning in &warnings {
        log::warn!("{}", warning);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, ContentSection, Repo, Section};
    use std::sync::Arc;
    use url::Url;

    fn document(html: &str) -> Document {
        let repo = Arc::new(Repo {
            id: "main".into(),
            base_uri: Url::parse("file:///repo/").unwrap(),
        });
        let mut section = ContentSection::new("Guide", 2);
        section.chapters.push(Chapter::new("intro", repo, html));
        let mut doc = Document::new("doc");
        doc.sections.push(Section::Content(section));
        doc
    }

    #[test]
    fn test_dangling_link() {
        let doc = document(r##"<h2 id="here">x</h2><a href="#missing">m</a><a href="#here">h</a>"##);
        let warnings = check_links(&doc);
        assert_eq!(
            warnings,
            vec![LinkWarning::Dangling {
                section: "Guide".into(),
                chapter: "intro".into(),
                target: "missing".into(),
            }]
        );
    }

    #[test]
    fn test_structural_ids_resolve() {
        let doc = document(
            r##"<a href="#doc-guide">s</a><a href='#doc-guide-intro'>c</a><a href="#">top</a><a href="other.html#x">o</a>"##,
        );
        assert!(check_links(&doc).is_empty());
    }

    #[test]
    fn test_unquoted_ids_resolve() {
        let doc = document(r##"<h2 id=intro>Intro</h2><a href="#intro">i</a>"##);
        assert!(check_links(&doc).is_empty());
    }

    #[test]
    fn test_duplicate_section_ids() {
        let mut doc = document("");
        doc.sections
            .push(Section::Content(ContentSection::new("guide", 1)));
        let warnings = check_links(&doc);
        assert_eq!(
            warnings,
            vec![LinkWarning::DuplicateId {
                id: "doc-guide".into()
            }]
        );
        assert_eq!(warnings[0].to_string(), "Duplicate anchor id 'doc-guide'");
    }
}
