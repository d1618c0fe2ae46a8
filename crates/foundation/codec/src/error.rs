use std::{error, fmt, io};
use std::fmt::{Debug, Display, Formatter};

use thiserror::Error;


/// An error produced while parsing or writing the binary node stream itself: framing,
/// escaping, and primitive value decoding. Distinct from [`StructureError`], which is raised
/// by higher layers once a node tree has been parsed successfully but doesn't contain what
/// the caller expected.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unexpected end of node stream")]
    UnexpectedEof,
    #[error("expected identifier {expected:?}, found {found:?}")]
    InvalidIdentifier {
        expected: [u8; 4],
        found:    [u8; 4],
    },
    #[error("expected a node to start with the START byte, found 0x{found:02X}")]
    MissingNodeStart {
        found: u8,
    },
    #[error("expected a node to end with the END byte, found 0x{found:02X}")]
    MissingNodeEnd {
        found: u8,
    },
    #[error("node nesting exceeded the depth limit of {limit}")]
    ExceededDepthLimit {
        limit: usize,
    },
    #[error("string contained invalid UTF-8")]
    InvalidUtf8String,
    #[error("{0}")]
    Custom(Box<str>),
}

impl CodecError {
    pub fn custom<T: Into<String>>(message: T) -> Self {
        Self::Custom(message.into().into_boxed_str())
    }
}

/// A structural error raised once a node tree is already available: a required attribute
/// tag was never seen, a primitive read came back empty-handed, or a node's child didn't
/// have the type the caller expected.
#[derive(Debug)]
pub enum StructureError {
    /// A codec-level framing or primitive-decoding error.
    Codec(Box<CodecError>),
    /// A structural mismatch in an otherwise well-framed node tree.
    Structure(Box<NodeStructureError>),
    /// A custom error, for callers building their own higher-level parsers on this crate.
    Custom(anyhow::Error),
}

impl StructureError {
    pub fn structure(error: NodeStructureError) -> Self {
        Self::Structure(Box::new(error))
    }
}

impl From<CodecError> for StructureError {
    fn from(error: CodecError) -> Self {
        Self::Codec(Box::new(error))
    }
}

impl From<NodeStructureError> for StructureError {
    fn from(error: NodeStructureError) -> Self {
        Self::Structure(Box::new(error))
    }
}

impl Display for StructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(error)     => Display::fmt(error, f),
            Self::Structure(error) => Display::fmt(error, f),
            Self::Custom(custom)   => Display::fmt(custom, f),
        }
    }
}

impl error::Error for StructureError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Codec(error)     => Some(error),
            Self::Structure(error) => Some(error),
            Self::Custom(custom)   => Some(&**custom),
        }
    }
}

/// An error associated with the structure of a parsed node tree: a conflict between the
/// expected and actual shape of the tree, as opposed to a framing-level decode failure.
#[derive(Error, Debug, Clone)]
pub enum NodeStructureError {
    #[error("missing attribute \"{tag_name}\"")]
    MissingAttribute {
        tag_name: Box<str>,
    },
    #[error("expected child node of type {expected}, found type {found}")]
    UnexpectedNodeType {
        expected: u8,
        found:    u8,
    },
    #[error("expected a child node, found none")]
    MissingChild,
    #[error("read failed for field \"{field_name}\"")]
    FieldReadFailed {
        field_name: Box<str>,
    },
}

impl NodeStructureError {
    pub fn missing_attribute<T: Into<String>>(tag_name: T) -> Self {
        Self::MissingAttribute { tag_name: tag_name.into().into_boxed_str() }
    }

    pub fn unexpected_node_type(expected: u8, found: u8) -> Self {
        Self::UnexpectedNodeType { expected, found }
    }

    pub fn field_read_failed<T: Into<String>>(field_name: T) -> Self {
        Self::FieldReadFailed { field_name: field_name.into().into_boxed_str() }
    }
}
