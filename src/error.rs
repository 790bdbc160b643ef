//! Error types for the docparam library.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::apply::Phase;

/// Result type alias for docparam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, extracting, applying or saving documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested document file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file is not a readable WordprocessingML package.
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// A parameter schema is malformed or internally inconsistent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A base-style chain loops back on itself.
    #[error("Cyclic style inheritance: {}", .chain.join(" -> "))]
    CyclicInheritance {
        /// Style names in walk order, ending with the repeated name.
        chain: Vec<String>,
    },

    /// A style names a base style that exists nowhere.
    #[error("Style '{style}' is based on unknown style '{base}'")]
    UnknownBaseStyle {
        /// The style carrying the dangling link.
        style: String,
        /// The missing base style name.
        base: String,
    },

    /// A name or index reference could not be resolved.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    /// A mutation failed after validation had passed.
    #[error("Apply failed in phase {phase} at {item}: {source}")]
    PartialApply {
        /// The phase that was running.
        phase: Phase,
        /// The item being written when the failure happened.
        item: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Error while serializing a result.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stable, machine-readable error kind reported across the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IoError,
    NotFound,
    CorruptContainer,
    ValidationError,
    CyclicInheritance,
    UnknownBaseStyle,
    UnknownReference,
    PartialApplyFailure,
    SerializationError,
}

impl Error {
    /// The structured kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::IoError,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::CorruptContainer(_) => ErrorKind::CorruptContainer,
            Error::Validation(_) => ErrorKind::ValidationError,
            Error::CyclicInheritance { .. } => ErrorKind::CyclicInheritance,
            Error::UnknownBaseStyle { .. } => ErrorKind::UnknownBaseStyle,
            Error::UnknownReference(_) => ErrorKind::UnknownReference,
            Error::PartialApply { .. } => ErrorKind::PartialApplyFailure,
            Error::Serialization(_) => ErrorKind::SerializationError,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::CorruptContainer(format!("ZIP archive error: {}", err))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptContainer(format!("XML parse error: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::CorruptContainer(format!("XML attribute error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Serialization(err.to_string())
        } else {
            Error::Validation(format!("invalid parameter JSON: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CyclicInheritance {
            chain: vec!["X".into(), "Y".into(), "X".into()],
        };
        assert_eq!(err.to_string(), "Cyclic style inheritance: X -> Y -> X");

        let err = Error::UnknownBaseStyle {
            style: "Body".into(),
            base: "Missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Style 'Body' is based on unknown style 'Missing'"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::IoError);
    }

    #[test]
    fn test_partial_apply_kind() {
        let err = Error::PartialApply {
            phase: Phase::Sections,
            item: "section 2".into(),
            source: Box::new(Error::validation("page width must be positive")),
        };
        assert_eq!(err.kind(), ErrorKind::PartialApplyFailure);
        assert!(err.to_string().contains("sections"));
        assert!(err.to_string().contains("section 2"));
    }

    #[test]
    fn test_json_error_is_validation() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }
}
