//! C++ front-end for heartgen built on tree-sitter-cpp.
//!
//! Files are parsed in isolation: the codegen macro expansions are applied
//! textually and `#include`s are not followed, so include directories are
//! accepted but unused.

mod lower;
mod preprocess;

pub use lower::lower;
pub use preprocess::{prepare_source, CODEGEN_ACTIVE_DEFINE, DIRECTIVE_MACROS, HIDE_MACRO};

use heartgen_core::{CursorTree, FrontEnd, FrontEndError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use tree_sitter::Parser;

#[derive(Debug, Clone, Copy, Default)]
pub struct CppFrontEnd;

impl CppFrontEnd {
    pub fn new() -> Self {
        Self
    }

    /// Parse source text that was already loaded from `file`
    pub fn parse_source(&self, file: &Path, source: &str) -> Result<CursorTree, FrontEndError> {
        let prepared = prepare_source(source);

        let mut parser = Parser::new();
        parser
            .set_language(tree_sitter_cpp::language())
            .map_err(|err| FrontEndError::Parse {
                path: file.to_path_buf(),
                message: err.to_string(),
            })?;

        let syntax = parser.parse(&prepared, None).ok_or_else(|| FrontEndError::Parse {
            path: file.to_path_buf(),
            message: "parser produced no syntax tree".to_string(),
        })?;

        if syntax.root_node().has_error() {
            warn!(file = %file.display(), "Syntax errors found, scanning the recovered tree");
        }

        let tree = lower(&syntax, &prepared, file);
        trace!(file = %file.display(), cursors = tree.len(), "Lowered");
        Ok(tree)
    }
}

impl FrontEnd for CppFrontEnd {
    fn parse(&self, file: &Path, include_dirs: &[PathBuf]) -> Result<CursorTree, FrontEndError> {
        let bytes = fs::read(file).map_err(|source| FrontEndError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        debug!(file = %file.display(), include_dirs = include_dirs.len(), "Parsing");
        self.parse_source(file, &String::from_utf8_lossy(&bytes))
    }
}
