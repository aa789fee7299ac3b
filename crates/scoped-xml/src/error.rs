//! Error types for scoped XML trees.

use thiserror::Error;

/// Result type alias for scoped-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
///
/// Callers that process many inputs can use this to decide whether to skip
/// one malformed input or abort entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value violating the namespace invariants was about to be built.
    Construction,
    /// A non-default prefix could not be resolved.
    Resolution,
    /// The event stream did not describe a single well-formed element tree.
    Parse,
    /// Serialization failed.
    Output,
}

/// Errors raised while building, parsing or printing scoped XML trees.
#[derive(Debug, Error)]
pub enum Error {
    /// A non-default prefix is used but not bound in the scope.
    #[error("Unbound namespace prefix '{prefix}'")]
    UnboundPrefix { prefix: String },

    /// A scope or declaration mapping violates the scope invariants.
    #[error("Invalid scope: {message}")]
    InvalidScope { message: String },

    /// A syntactic name is not of the form `local` or `prefix:local`.
    #[error("Malformed qualified name '{name}'")]
    MalformedName { name: String },

    /// An element or attribute name does not resolve to its own namespace.
    #[error(
        "Name '{name}' resolves to namespace {resolved:?} in its scope, but carries {declared:?}"
    )]
    InconsistentName {
        name: String,
        declared: Option<String>,
        resolved: Option<String>,
    },

    /// Two attributes share the same expanded name.
    #[error("Duplicate attribute '{name}'")]
    DuplicateAttribute { name: String },

    /// A scope extension would rebind a prefix already bound differently.
    #[error("Prefix '{prefix}' is already bound to '{existing}', cannot bind it to '{requested}'")]
    ConflictingBinding {
        prefix: String,
        existing: String,
        requested: String,
    },

    /// Deep scope extension was asked to introduce a default namespace.
    #[error("Scope extension cannot introduce a default namespace ('{namespace}')")]
    DefaultNamespaceExtension { namespace: String },

    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message}{}", .position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    XmlSyntax {
        message: String,
        /// Byte offset where the error occurred.
        position: Option<u64>,
    },

    /// End tag does not match the open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String },

    /// The event stream ended while something was still expected.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    /// Events arrived in an order that cannot describe an element tree.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure { message: String },

    /// No root element was ever started.
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// A second top-level element was started.
    #[error("Invalid XML: multiple root elements (second root <{name}>)")]
    MultipleRoots { name: String },

    /// A non-default prefix would have to be undeclared, which XML 1.0 cannot express.
    #[error("Cannot undeclare namespace prefix '{prefix}' in XML 1.0 output")]
    PrefixUndeclaration { prefix: String },

    /// Comment text that cannot be written inside `<!--` and `-->`.
    #[error("Comment cannot contain '--' or end with '-': {content:?}")]
    UnprintableComment { content: String },

    /// I/O error while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidScope { .. }
            | Error::MalformedName { .. }
            | Error::InconsistentName { .. }
            | Error::DuplicateAttribute { .. }
            | Error::ConflictingBinding { .. }
            | Error::DefaultNamespaceExtension { .. } => ErrorKind::Construction,
            Error::UnboundPrefix { .. } => ErrorKind::Resolution,
            Error::XmlSyntax { .. }
            | Error::MismatchedEndTag { .. }
            | Error::UnexpectedEof { .. }
            | Error::InvalidStructure { .. }
            | Error::EmptyDocument
            | Error::MultipleRoots { .. } => ErrorKind::Parse,
            Error::PrefixUndeclaration { .. } | Error::UnprintableComment { .. } | Error::Io(_) => {
                ErrorKind::Output
            }
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::XmlSyntax {
                message: other.to_string(),
                position: None,
            },
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            position: None,
        }
    }
}
