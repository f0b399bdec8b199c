use crate::cursor::SourceLocation;
use std::path::PathBuf;
use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

/// Category of a recoverable scan problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanErrorKind {
    /// Directive marker in an invalid context (nested or orphaned)
    StructuralDirective,
    /// Reflected declaration is not a publicly accessible struct/class
    Accessibility,
    /// Reflected type body ended while a directive was pending
    IncompleteDeclaration,
    /// Directive precedes a member it cannot apply to
    InvalidMember,
    /// The file could not be read or parsed
    FrontEnd,
}

impl ScanErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ScanErrorKind::StructuralDirective => "structural-directive",
            ScanErrorKind::Accessibility => "accessibility",
            ScanErrorKind::IncompleteDeclaration => "incomplete-declaration",
            ScanErrorKind::InvalidMember => "invalid-member",
            ScanErrorKind::FrontEnd => "front-end",
        }
    }
}

/// A problem found while scanning one file. Never fatal to the run.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (at {location})")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub message: String,
    pub location: SourceLocation,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn structural(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ScanErrorKind::StructuralDirective, message, location)
    }

    pub fn accessibility(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ScanErrorKind::Accessibility, message, location)
    }

    pub fn incomplete(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ScanErrorKind::IncompleteDeclaration, message, location)
    }

    pub fn invalid_member(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ScanErrorKind::InvalidMember, message, location)
    }
}

/// Errors that abort a generator run
#[derive(Error, Debug)]
pub enum GenError {
    #[error("scan root does not exist or is not a directory: {0}")]
    RootNotFound(PathBuf),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
