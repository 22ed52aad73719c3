//! TOC document parser.
//!
//! One depth-first pass over the TOC's XML events builds the document tree.
//! Chapters are loaded and converted as soon as their element is seen. The
//! parser itself only holds read-only registries and options; everything that
//! changes while parsing lives in a [`ParseState`] value that each element
//! handler takes and returns.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use url::Url;

use crate::convert::{ConverterRegistry, FragmentResolver};
use crate::error::{Error, Result};
use crate::generate::{self, GeneratorRegistry};
use crate::model::{Chapter, ContentSection, Document, GeneratedSection, MetaSection, Section};
use crate::process::PostProcessorRegistry;

use super::options::ParseOptions;
use super::properties::load_properties;

/// Root element of every TOC document.
pub const ROOT_ELEMENT: &str = "document";

/// Metadata key receiving the `<document version>` attribute.
pub const VERSION_KEY: &str = "toc.version";

/// Attributes of `psection`/`hsection` that are not passed to the generator.
const GENERATED_SECTION_ATTRIBUTES: [&str; 3] = ["title", "classname", "rotate"];

/// TOC document parser.
#[derive(Debug, Clone, Copy)]
pub struct TocParser<'a> {
    converters: &'a ConverterRegistry,
    processors: &'a PostProcessorRegistry,
    generators: &'a GeneratorRegistry,
    options: &'a ParseOptions,
}

/// Section the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Directly below `<document>`
    Root,
    /// Index into `Document::sections`
    Section(usize),
    /// Index into `Document::header_sections`
    HeaderSection(usize),
}

/// Everything that changes while one TOC document is parsed.
#[derive(Debug)]
struct ParseState {
    document: Document,

    /// Base URI for relative repo and property paths
    base: Option<Url>,

    cursor: Cursor,

    /// Names of the currently open elements, outermost first
    open: Vec<String>,

    seen_root: bool,
}

/// A TOC element with its unescaped attributes.
#[derive(Debug, Clone)]
struct Element {
    name: String,
    attrs: IndexMap<String, String>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = IndexMap::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| xml_error(e, format!("<{}>", name)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8(attr.value.to_vec())
                .map_err(|e| Error::validation(&name, &key, e.to_string()))?;
            let value = unescape(&raw)
                .map_err(|e| Error::validation(&name, &key, e.to_string()))?
                .into_owned();
            attrs.insert(key, value);
        }

        Ok(Self { name, attrs })
    }

    fn get(&self, attribute: &str) -> Option<&str> {
        self.attrs.get(attribute).map(String::as_str)
    }

    fn required(&self, attribute: &str) -> Result<&str> {
        match self.get(attribute) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            Some(_) => Err(Error::validation(&self.name, attribute, "must not be empty")),
            None => Err(Error::validation(
                &self.name,
                attribute,
                "required attribute is missing",
            )),
        }
    }

    /// Presence flag; any value (even empty) counts.
    fn flag(&self, attribute: &str) -> bool {
        self.attrs.contains_key(attribute)
    }

    fn int(&self, attribute: &str) -> Result<Option<i32>> {
        self.get(attribute)
            .map(|value| {
                value.trim().parse::<i32>().map_err(|_| {
                    Error::validation(&self.name, attribute, format!("not an integer: '{}'", value))
                })
            })
            .transpose()
    }

    fn attributes_except(&self, reserved: &[&str]) -> IndexMap<String, String> {
        self.attrs
            .iter()
            .filter(|(key, _)| !reserved.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<'a> TocParser<'a> {
    /// Create a parser over the given registries.
    pub fn new(
        converters: &'a ConverterRegistry,
        processors: &'a PostProcessorRegistry,
        generators: &'a GeneratorRegistry,
        options: &'a ParseOptions,
    ) -> Self {
        Self {
            converters,
            processors,
            generators,
            options,
        }
    }

    /// Parse a TOC file.
    ///
    /// The TOC base name is the file stem unless overridden in the options;
    /// relative paths resolve against the file's directory unless a base URL
    /// is configured.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        let name = match &self.options.toc_base_name {
            Some(name) => name.clone(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let result = fs::read_to_string(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
                _ => Error::Io(e),
            })
            .and_then(|source| {
                let base = match &self.options.base_url {
                    Some(url) => url.clone(),
                    None => directory_url(path)?,
                };
                self.parse_source(&source, &name, Some(base))
            });

        result.map_err(|e| e.in_document(name))
    }

    /// Parse TOC source text.
    ///
    /// `name` is the TOC base name unless overridden in the options. Without
    /// a configured base URL, repos and property files must use absolute
    /// locations.
    pub fn parse_str(&self, source: &str, name: &str) -> Result<Document> {
        let name = self.options.toc_base_name.as_deref().unwrap_or(name);
        self.parse_source(source, name, self.options.base_url.clone())
            .map_err(|e| e.in_document(name))
    }

    fn parse_source(&self, source: &str, name: &str, base: Option<Url>) -> Result<Document> {
        let mut document = Document::new(name);
        document.metadata = self.options.metadata.clone();

        let mut state = ParseState {
            document,
            base,
            cursor: Cursor::Root,
            open: Vec::new(),
            seen_root: false,
        };

        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = Element::from_start(&e)?;
                    state = self.start_element(state, element)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = Element::from_start(&e)?;
                    let name = element.name.clone();
                    state = self.start_element(state, element)?;
                    state = self.end_element(state, &name);
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    state = self.end_element(state, &name);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(xml_error(e, format!("at byte {}", reader.error_position())))
                }
                _ => {}
            }
        }

        if !state.seen_root {
            return Err(Error::structural(
                ROOT_ELEMENT,
                "the TOC has no root element",
            ));
        }
        if let Some(unclosed) = state.open.last() {
            return Err(Error::Xml(format!("unclosed element <{}>", unclosed)));
        }

        log::debug!(
            "Parsed TOC '{}': {} sections, {} chapters, {} repos",
            name,
            state.document.section_count(),
            state.document.chapter_count(),
            state.document.repos.len()
        );
        Ok(state.document)
    }

    fn start_element(&self, mut state: ParseState, element: Element) -> Result<ParseState> {
        if state.open.is_empty() {
            if state.seen_root || element.name != ROOT_ELEMENT {
                return Err(Error::structural(
                    &element.name,
                    "the root element must be a single <document>",
                ));
            }
            state.seen_root = true;
            if let Some(version) = element.get("version") {
                state
                    .document
                    .metadata
                    .insert(VERSION_KEY.to_string(), version.to_string());
            }
            state.open.push(element.name);
            return Ok(state);
        }

        let mut state = match element.name.as_str() {
            ROOT_ELEMENT => Err(Error::structural(ROOT_ELEMENT, "cannot be nested")),
            "header" => Ok(self.header(state, &element)),
            "link" | "meta" | "base" => {
                state
                    .document
                    .add_head_element(&element.name, element.attrs.clone());
                Ok(state)
            }
            "properties" | "repos" | "postprocessors" => Ok(state),
            "property" => self.property(state, &element),
            "repo" => self.repo(state, &element),
            "section" | "metasection" => self.section(state, &element),
            "psection" | "hsection" => self.generated_section(state, &element),
            "chapters" => self.chapters(state, &element),
            "chapter" => self.chapter(state, &element),
            "element" => self.element(state, &element),
            "postprocessor" => self.postprocessor(state, &element),
            other => {
                log::warn!("Ignoring unknown TOC element <{}>", other);
                Ok(state)
            }
        }?;

        state.open.push(element.name);
        Ok(state)
    }

    fn end_element(&self, mut state: ParseState, name: &str) -> ParseState {
        state.open.pop();
        if matches!(name, "section" | "metasection" | "psection" | "hsection") {
            state.cursor = Cursor::Root;
        }
        state
    }

    fn header(&self, mut state: ParseState, element: &Element) -> ParseState {
        if let Some(title) = element.get("title") {
            state.document.set_title(title);
        }
        state
    }

    fn property(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        if let Some(src) = element.get("src") {
            let path = property_path(state.base.as_ref(), src)?;
            for (key, value) in load_properties(&path)? {
                state.document.metadata.insert(key, value);
            }
            return Ok(state);
        }

        if !element.flag("key") {
            return Err(Error::validation(
                &element.name,
                "key",
                "either 'key' and 'value' or 'src' is required",
            ));
        }
        let key = element.required("key")?;
        let value = element
            .get("value")
            .ok_or_else(|| Error::validation(&element.name, "value", "required with 'key'"))?;
        state
            .document
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(state)
    }

    fn repo(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        let id = element.required("id")?;
        let uri = element.required("uri")?;
        state
            .document
            .repos
            .register(id, uri, state.base.as_ref())?;
        Ok(state)
    }

    fn section(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        ensure_top_level(&state, element)?;
        let title = element.required("title")?;
        let rotated = element.flag("rotate");

        let level = match element.name.as_str() {
            "section" => element.int("level")?,
            _ => None,
        };
        let section = match level {
            Some(level) => {
                let mut section = ContentSection::new(title, level);
                section.rotated = rotated;
                Section::Content(section)
            }
            None => {
                let mut section = MetaSection::new(title);
                section.rotated = rotated;
                Section::Meta(section)
            }
        };

        state.document.sections.push(section);
        state.cursor = Cursor::Section(state.document.sections.len() - 1);
        Ok(state)
    }

    fn generated_section(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        ensure_top_level(&state, element)?;
        let title = element.required("title")?;
        let classname = element.required("classname")?;
        if !self.generators.contains(classname) {
            return Err(Error::Configuration(format!(
                "Unknown section generator '{}' on <{}>",
                classname, element.name
            )));
        }

        let mut section = GeneratedSection::new(title, classname);
        section.rotated = element.flag("rotate");
        section.config = element.attributes_except(&GENERATED_SECTION_ATTRIBUTES);
        generate::max_level(&section.config)?;

        if element.name == "hsection" {
            state.document.header_sections.push(Section::Header(section));
            state.cursor = Cursor::HeaderSection(state.document.header_sections.len() - 1);
        } else {
            state.document.sections.push(Section::Pseudo(section));
            state.cursor = Cursor::Section(state.document.sections.len() - 1);
        }
        Ok(state)
    }

    fn chapters(&self, state: ParseState, element: &Element) -> Result<ParseState> {
        content_section_index(&state, element)?;
        Ok(state)
    }

    fn chapter(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        let index = content_section_index(&state, element)?;
        let repo_id = element.required("repo")?;
        let fragment = element.required("fragment")?;
        let level_offset = element.int("level")?.unwrap_or(0);
        let config = element.get("config");

        let repo = state.document.repos.resolve(repo_id)?;
        let resolver = FragmentResolver::new(self.converters, &self.options.default_extension);
        let html = resolver.resolve(&repo, fragment, config, &state.document.metadata)?;

        let chapter = Chapter::new(fragment, repo, html)
            .with_level_offset(level_offset)
            .with_rotated(element.flag("rotate"))
            .with_config(config.map(str::to_string));

        if let Some(section) = state.document.sections[index].as_content_mut() {
            section.chapters.push(chapter);
        }
        Ok(state)
    }

    fn element(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        let key = element.required("key")?;
        let value = state.document.metadata.get(key).cloned();

        let section = match state.cursor {
            Cursor::Section(index) => &mut state.document.sections[index],
            Cursor::HeaderSection(index) => &mut state.document.header_sections[index],
            Cursor::Root => {
                return Err(Error::structural(
                    &element.name,
                    "must be nested in a section",
                ))
            }
        };

        let Some(value) = value else {
            log::debug!("No metadata for <element key=\"{}\">; skipped", key);
            return Ok(state);
        };
        if !section.push_element(key.to_string(), value) {
            return Err(Error::structural(
                &element.name,
                "only content and meta sections hold elements",
            ));
        }
        Ok(state)
    }

    fn postprocessor(&self, mut state: ParseState, element: &Element) -> Result<ParseState> {
        let classname = element.required("classname")?;
        let config = element.attributes_except(&["classname"]);
        self.processors.create(classname, &config)?;
        state
            .document
            .post_processors
            .push((classname.to_string(), config));
        Ok(state)
    }
}

/// Convert a reader error, prefixing syntax errors with where they occurred.
fn xml_error(err: impl Into<quick_xml::Error>, context: String) -> Error {
    match Error::from(err.into()) {
        Error::Xml(message) => Error::Xml(format!("{}: {}", context, message)),
        other => other,
    }
}

fn ensure_top_level(state: &ParseState, element: &Element) -> Result<()> {
    match state.cursor {
        Cursor::Root => Ok(()),
        _ => Err(Error::structural(
            &element.name,
            "sections cannot be nested",
        )),
    }
}

fn content_section_index(state: &ParseState, element: &Element) -> Result<usize> {
    match state.cursor {
        Cursor::Section(index) if state.document.sections[index].as_content().is_some() => {
            Ok(index)
        }
        _ => Err(Error::structural(
            &element.name,
            "must be nested in a <section> with a level",
        )),
    }
}

fn property_path(base: Option<&Url>, src: &str) -> Result<PathBuf> {
    let Some(base) = base else {
        return Ok(PathBuf::from(src));
    };
    let unresolved = |detail: String| Error::Reference {
        kind: "property file",
        target: detail,
    };
    let url = base
        .join(src)
        .map_err(|e| unresolved(format!("{} ({})", src, e)))?;
    url.to_file_path().map_err(|_| unresolved(url.to_string()))
}

fn directory_url(path: &Path) -> Result<Url> {
    let absolute = std::path::absolute(path)?;
    let dir = absolute.parent().unwrap_or(&absolute);
    Url::from_directory_path(dir).map_err(|_| Error::Reference {
        kind: "base uri",
        target: dir.display().to_string(),
    })
}
