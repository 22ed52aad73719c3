//! Heading-level arithmetic and anchor identifiers.
//!
//! Every addressable part of an assembled document gets a slug derived from
//! the names above it:
//!
//! - section: `slug(toc_base_name, section_name)`
//! - chapter: `slug(section_id, fragment_name)`
//! - heading: `slug(chapter_id, heading_text)`
//!
//! Cross-references between fragments rely on these being stable, so the
//! functions here are pure and never fail.

use regex::Regex;
use std::sync::LazyLock;

/// Offset subtracted from `level_offset + section_level`.
///
/// A chapter at offset 0 in a level-2 section keeps its headings unchanged.
pub const LEVEL_ADJUSTMENT: i32 = 2;

static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_]+").unwrap());
static NON_SLUG_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9-]").unwrap());

/// Heading depth shift applied to a chapter's content.
///
/// # Example
///
/// ```
/// use folio::ids::effective_level;
///
/// assert_eq!(effective_level(0, 2), 0);
/// assert_eq!(effective_level(1, 1), 0);
/// assert_eq!(effective_level(4, 2), 4);
/// ```
pub fn effective_level(level_offset: i32, section_level: i32) -> i32 {
    level_offset + section_level - LEVEL_ADJUSTMENT
}

/// Build an anchor-safe identifier from one or more name parts.
///
/// Parts are joined with `-`, lowercased and trimmed; each run of whitespace
/// or underscores becomes a single `-`, and anything outside `[A-Za-z0-9-]`
/// is dropped.
///
/// # Example
///
/// ```
/// use folio::ids::slug;
///
/// assert_eq!(slug(&["Section One"]), "section-one");
/// assert_eq!(slug(&["a_b  c!"]), "a-b-c");
/// assert_eq!(slug(&["manual", "Getting Started"]), "manual-getting-started");
/// ```
pub fn slug<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    let separated = SEPARATOR_RUN.replace_all(joined.trim(), "-");
    NON_SLUG_CHAR.replace_all(&separated, "").into_owned()
}

/// Identifier of a section within a TOC.
pub fn section_id(toc_base_name: &str, section_name: &str) -> String {
    slug(&[toc_base_name, section_name])
}

/// Identifier of a chapter within its section.
pub fn chapter_id(section_id: &str, fragment_name: &str) -> String {
    slug(&[section_id, fragment_name])
}

/// Identifier of a heading within its chapter.
pub fn heading_id(chapter_id: &str, heading_text: &str) -> String {
    slug(&[chapter_id, heading_text])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_level_table() {
        assert_eq!(effective_level(0, 2), 0);
        assert_eq!(effective_level(1, 2), 1);
        assert_eq!(effective_level(4, 2), 4);
        assert_eq!(effective_level(1, 1), 0);
        assert_eq!(effective_level(0, 1), -1);
        assert_eq!(effective_level(-2, 2), -2);
    }

    #[test]
    fn test_slug_basic() {
        assert_eq!(slug(&["Section One"]), "section-one");
        assert_eq!(slug(&["a_b  c!"]), "a-b-c");
        assert_eq!(slug(&["  Padded  "]), "padded");
    }

    #[test]
    fn test_slug_joins_parts() {
        assert_eq!(slug(&["test", "S1"]), "test-s1");
        assert_eq!(slug(&["test-s1", "intro"]), "test-s1-intro");
        assert_eq!(heading_id("test-s1-intro", "Header"), "test-s1-intro-header");
    }

    #[test]
    fn test_slug_strips_non_ascii_and_punctuation() {
        assert_eq!(slug(&["Café & Bar"]), "caf--bar");
        assert_eq!(slug(&["v1.2 (beta)"]), "v12-beta");
        assert_eq!(slug(&["!!!"]), "");
        assert_eq!(slug::<&str>(&[]), "");
    }

    #[test]
    fn test_slug_idempotent() {
        let inputs = [
            "Section One",
            "a_b  c!",
            "  Mixed_Case Text\twith\ttabs ",
            "Ünïcödé heading",
            "--already-slugged--",
        ];
        for input in inputs {
            let once = slug(&[input]);
            assert_eq!(slug(&[once.as_str()]), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_ids_compose() {
        let section = section_id("manual", "Getting Started");
        assert_eq!(section, "manual-getting-started");
        let chapter = chapter_id(&section, "install_guide");
        assert_eq!(chapter, "manual-getting-started-install-guide");
    }
}
