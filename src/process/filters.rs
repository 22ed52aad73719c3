//! Built-in post-processing filters.

use crate::error::Result;
use crate::html::{self, HEADING};
use crate::ids;
use crate::model::Metadata;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

use super::{ChapterContext, FilterConfig, PostProcessor};

/// Upper bound on substitution re-scans for one chapter.
///
/// Values referring to themselves (directly or through other keys) would
/// otherwise expand forever.
pub const MAX_SUBSTITUTION_PASSES: usize = 64;

/// Upper bound, in bytes, on how much substitution may grow one chapter.
///
/// Values that reference themselves more than once double on every pass, so
/// the pass limit alone does not bound the output.
pub const MAX_SUBSTITUTION_GROWTH: usize = 1 << 20;

static HEADING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([hH])([0-9]+)\b").unwrap());

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<a\b[^>]*?\shref\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Shifts every `<hN>` / `</hN>` by the chapter's effective level.
///
/// There is no upper bound; levels below 1 are raised to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderLevelIncrement;

impl HeaderLevelIncrement {
    pub const NAME: &'static str = "header-level-increment";

    pub fn factory(_config: &FilterConfig) -> Result<Box<dyn PostProcessor>> {
        Ok(Box::new(Self))
    }

    /// Shift heading levels in `html` by `increment`.
    pub fn rewrite(html: &str, increment: i32) -> String {
        if increment == 0 {
            return html.to_string();
        }
        HEADING_TAG
            .replace_all(html, |caps: &Captures| match caps[3].parse::<i64>() {
                Ok(level) => {
                    let shifted = (level + i64::from(increment)).max(1);
                    format!("<{}{}{}", &caps[1], &caps[2], shifted)
                }
                Err(_) => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl PostProcessor for HeaderLevelIncrement {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, ctx: &ChapterContext<'_>, html: &str) -> String {
        Self::rewrite(html, ctx.effective_level)
    }
}

/// Adds `id="<chapter id>-<heading slug>"` to every heading without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdInjection;

impl HeaderIdInjection {
    pub const NAME: &'static str = "header-id-injection";

    pub fn factory(_config: &FilterConfig) -> Result<Box<dyn PostProcessor>> {
        Ok(Box::new(Self))
    }

    /// Inject heading ids derived from `chapter_id`.
    pub fn rewrite(html: &str, chapter_id: &str) -> String {
        HEADING
            .replace_all(html, |caps: &Captures| {
                let attrs = &caps[2];
                if html::id_attribute(attrs).is_some() {
                    return caps[0].to_string();
                }
                let id = ids::heading_id(chapter_id, &html::heading_text(&caps[3]));
                format!(
                    "<h{}{} id=\"{}\">{}{}",
                    &caps[1], attrs, id, &caps[3], &caps[4]
                )
            })
            .into_owned()
    }
}

impl PostProcessor for HeaderIdInjection {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, ctx: &ChapterContext<'_>, html: &str) -> String {
        Self::rewrite(html, ctx.chapter_id)
    }
}

/// Resolves relative `<img src>` paths against the chapter's repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageHrefResolution;

impl ImageHrefResolution {
    pub const NAME: &'static str = "image-href-resolution";

    pub fn factory(_config: &FilterConfig) -> Result<Box<dyn PostProcessor>> {
        Ok(Box::new(Self))
    }
}

impl PostProcessor for ImageHrefResolution {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, ctx: &ChapterContext<'_>, html: &str) -> String {
        rewrite_attribute(&IMG_SRC, html, ctx.repo_base)
    }
}

/// Resolves relative `<a href>` targets against the chapter's repository.
///
/// Same-document anchors (`#...`) are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkHrefResolution;

impl LinkHrefResolution {
    pub const NAME: &'static str = "link-href-resolution";

    pub fn factory(_config: &FilterConfig) -> Result<Box<dyn PostProcessor>> {
        Ok(Box::new(Self))
    }
}

impl PostProcessor for LinkHrefResolution {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, ctx: &ChapterContext<'_>, html: &str) -> String {
        rewrite_attribute(&ANCHOR_HREF, html, ctx.repo_base)
    }
}

/// Replaces `${name}` with document metadata until nothing changes.
///
/// Values may themselves contain `${other}` references. Unknown names become
/// a visible `[NOT FOUND: name]` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueSubstitution;

impl KeyValueSubstitution {
    pub const NAME: &'static str = "key-value-substitution";

    pub fn factory(_config: &FilterConfig) -> Result<Box<dyn PostProcessor>> {
        Ok(Box::new(Self))
    }

    /// Substitute metadata references in `text`.
    pub fn substitute(text: &str, metadata: &Metadata) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_SUBSTITUTION_PASSES {
            let next = PLACEHOLDER.replace_all(&current, |caps: &Captures| {
                let key = caps[1].trim();
                match metadata.get(key) {
                    Some(value) => value.clone(),
                    None => {
                        log::warn!("No value for placeholder ${{{}}}", key);
                        format!("[NOT FOUND: {}]", key)
                    }
                }
            });
            match next {
                Cow::Borrowed(_) => return current,
                Cow::Owned(next) if next == current => return current,
                Cow::Owned(next) if next.len() > text.len() + MAX_SUBSTITUTION_GROWTH => {
                    log::warn!(
                        "Placeholder substitution stopped at {} bytes; check for self-referencing values",
                        current.len()
                    );
                    return current;
                }
                Cow::Owned(next) => current = next,
            }
        }
        log::warn!(
            "Placeholder substitution stopped after {} passes; check for self-referencing values",
            MAX_SUBSTITUTION_PASSES
        );
        current
    }
}

impl PostProcessor for KeyValueSubstitution {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, ctx: &ChapterContext<'_>, html: &str) -> String {
        Self::substitute(html, ctx.metadata)
    }
}

fn rewrite_attribute(pattern: &Regex, html: &str, base: &Url) -> String {
    pattern
        .replace_all(html, |caps: &Captures| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            match resolve_reference(base, value) {
                Some(resolved) => format!("{}\"{}\"", &caps[1], html::escape_html(&resolved)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolve a relative reference; `None` when it should be left untouched.
fn resolve_reference(base: &Url, value: &str) -> Option<String> {
    let value = html::decode_entities(value.trim());
    if value.is_empty() || value.starts_with('#') || value.starts_with("//") {
        return None;
    }
    if Url::parse(&value).is_ok() {
        return None;
    }
    base.join(&value).ok().map(String::from)
}
