//! Reflection code generator for heart serialization.
//!
//! Source files are parsed by a [`FrontEnd`] into [`CursorTree`]s, scanned
//! for directive markers, and the collected metadata is rendered into a
//! single registration translation unit that is only rewritten when its
//! contents change.

pub mod classifier;
pub mod cursor;
pub mod emitter;
pub mod error;
pub mod generator;
pub mod markers;
pub mod render;
pub mod scanner;
pub mod store;
pub mod writer;

pub use classifier::{classify, TypePattern};
pub use cursor::{
    AccessSpecifier, ChildVisit, CursorId, CursorKind, CursorTree, FrontEnd, FrontEndError,
    NewCursor, SourceCursor, SourceLocation, TypeSignature,
};
pub use emitter::{CodeWriter, Scope};
pub use error::{GenError, GenResult, ScanError, ScanErrorKind};
pub use generator::{GenerationReport, Generator, GeneratorOptions, DEFAULT_EXTENSIONS, DEFAULT_OUTPUT};
pub use markers::{Directive, ALIAS_REF_MARKER, METHOD_MARKER, REFLECT_TYPE_MARKER};
pub use render::render;
pub use scanner::{scan_tree, FileScan, ScanState};
pub use store::{AuxInstantiations, FieldDescriptor, FieldKind, MetadataStore, TypeRecord};
pub use writer::{content_digest, write_if_changed, WriteOutcome};
