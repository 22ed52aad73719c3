//! Error types for folio library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for folio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while assembling a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The TOC document is not well-formed XML.
    #[error("TOC syntax error: {0}")]
    Xml(String),

    /// A required attribute is missing or has an invalid value.
    #[error("<{element}> attribute '{attribute}': {message}")]
    Validation {
        element: String,
        attribute: String,
        message: String,
    },

    /// A reference (repo id, URI) could not be resolved.
    #[error("Unresolved {kind} reference: {target}")]
    Reference { kind: &'static str, target: String },

    /// An element was used outside its allowed nesting.
    #[error("<{element}> is not allowed here: {message}")]
    Structural { element: String, message: String },

    /// A fragment or property file could not be found.
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// No converter, post-processor or generator is registered for a name.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A markup converter failed on a fragment.
    #[error("Conversion of {path} failed: {message}")]
    Conversion { path: PathBuf, message: String },

    /// A pipeline stage was invoked on a document in the wrong state.
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Error while serializing the finished model.
    #[error("Rendering error: {0}")]
    Render(String),

    /// An error raised while assembling a named TOC document.
    #[error("{name}: {source}")]
    Document {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Missing or invalid attribute on a TOC element.
    pub fn validation(
        element: impl Into<String>,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Validation {
            element: element.into(),
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Element used outside its allowed container.
    pub fn structural(element: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Structural {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Attach the TOC document name to an error.
    pub fn in_document(self, name: impl Into<String>) -> Self {
        match self {
            Error::Document { .. } => self,
            other => Error::Document {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with any document wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Document { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
            _ => Error::Xml(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(err.to_string())
    }
}
