//! Built-in converters for fragments that need no markup translation.

use crate::error::{Error, Result};
use crate::html::escape_html;

use super::{ConvertContext, Converter};

/// Pass-through converter for fragments already written in HTML.
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter {
    _private: (),
}

impl HtmlConverter {
    /// Create a new HTML converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Converter for HtmlConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm", "xhtml"]
    }

    fn name(&self) -> &str {
        "html"
    }

    fn convert(
        &self,
        raw: &[u8],
        _config: Option<&str>,
        ctx: &ConvertContext<'_>,
    ) -> Result<String> {
        let text = decode_utf8(raw, ctx)?;
        Ok(text.to_string())
    }
}

/// Plain text converter; wraps the escaped text in a `<pre>` block.
#[derive(Debug, Clone, Default)]
pub struct TextConverter {
    _private: (),
}

impl TextConverter {
    /// Create a new plain text converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Converter for TextConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn name(&self) -> &str {
        "text"
    }

    fn convert(
        &self,
        raw: &[u8],
        _config: Option<&str>,
        ctx: &ConvertContext<'_>,
    ) -> Result<String> {
        let text = decode_utf8(raw, ctx)?;
        Ok(format!("<pre>{}</pre>", escape_html(text)))
    }
}

fn decode_utf8<'a>(raw: &'a [u8], ctx: &ConvertContext<'_>) -> Result<&'a str> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    std::str::from_utf8(raw).map_err(|e| Error::Conversion {
        path: ctx.path.to_path_buf(),
        message: format!("fragment is not valid UTF-8: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, Repo};
    use std::path::Path;
    use url::Url;

    fn with_ctx<T>(f: impl FnOnce(&ConvertContext<'_>) -> T) -> T {
        let metadata = Metadata::new();
        let repo = Repo {
            id: "main".into(),
            base_uri: Url::parse("file:///repo/").unwrap(),
        };
        let ctx = ConvertContext {
            metadata: &metadata,
            repo: &repo,
            path: Path::new("/repo/intro.html"),
        };
        f(&ctx)
    }

    #[test]
    fn test_html_passthrough() {
        let html = with_ctx(|ctx| {
            HtmlConverter::new()
                .convert(b"\xEF\xBB\xBF<h1>Intro</h1>", None, ctx)
                .unwrap()
        });
        assert_eq!(html, "<h1>Intro</h1>");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = with_ctx(|ctx| {
            TextConverter::new()
                .convert(b"a < b && c", None, ctx)
                .unwrap()
        });
        assert_eq!(html, "<pre>a &lt; b &amp;&amp; c</pre>");
    }

    #[test]
    fn test_invalid_utf8_reports_path() {
        let err = with_ctx(|ctx| HtmlConverter::new().convert(&[0xff, 0xfe], None, ctx));
        match err {
            Err(Error::Conversion { path, .. }) => {
                assert_eq!(path, Path::new("/repo/intro.html"))
            }
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_converter_extensions() {
        let converter = HtmlConverter::new();
        assert!(converter.supports_extension("HTM"));
        assert!(!converter.supports_extension("txt"));
        assert_eq!(TextConverter::new().name(), "text");
    }
}
