//! Table of contents generator.

use super::{collect_outline, max_level, GeneratorConfig, PseudoSectionGenerator};
use crate::error::Result;
use crate::html::escape_html;
use crate::model::Document;

/// Emits a flat `<ul class="toc">` list of section and heading links.
#[derive(Debug, Clone, Copy, Default)]
pub struct TocGenerator;

impl TocGenerator {
    pub const NAME: &'static str = "toc";
}

impl PseudoSectionGenerator for TocGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(&self, doc: &Document, config: &GeneratorConfig) -> Result<String> {
        let max_level = max_level(config)?;
        let mut out = String::from("<ul class=\"toc\">\n");

        for section in collect_outline(doc, max_level) {
            push_item(&mut out, "toc-section", &section.id, &section.title);
            for heading in &section.headings {
                let class = format!("toc-level-{}", heading.level);
                push_item(&mut out, &class, &heading.id, &heading.text);
            }
        }

        out.push_str("</ul>\n");
        Ok(out)
    }
}

fn push_item(out: &mut String, class: &str, id: &str, text: &str) {
    out.push_str(&format!(
        "<li class=\"{}\"><a href=\"#{}\">{}</a></li>\n",
        class,
        escape_html(id),
        escape_html(text)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::processed_document;

    #[test]
    fn test_toc_output() {
        let doc = processed_document();
        let toc = TocGenerator.generate(&doc, &GeneratorConfig::new()).unwrap();
        let expected = concat!(
            "<ul class=\"toc\">\n",
            "<li class=\"toc-section\"><a href=\"#doc-intro\">Intro</a></li>\n",
            "<li class=\"toc-level-1\"><a href=\"#doc-intro-a-welcome\">Welcome</a></li>\n",
            "<li class=\"toc-level-2\"><a href=\"#doc-intro-a-details\">Details</a></li>\n",
            "<li class=\"toc-section\"><a href=\"#doc-reference\">Reference</a></li>\n",
            "<li class=\"toc-level-2\"><a href=\"#doc-reference-b-api\">API &amp; CLI</a></li>\n",
            "</ul>\n",
        );
        assert_eq!(toc, expected);
    }

    #[test]
    fn test_toc_maxlevel() {
        let doc = processed_document();
        let mut config = GeneratorConfig::new();
        config.insert("maxlevel".into(), "4".into());
        let toc = TocGenerator.generate(&doc, &config).unwrap();
        assert!(toc.contains("toc-level-4"));
        assert!(!toc.contains("No id"));
    }
}
