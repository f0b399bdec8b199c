//! Cursor tree produced by a front-end.
//!
//! A [`CursorTree`] is an arena of [`SourceCursor`] nodes addressed by
//! [`CursorId`]. The shape follows libclang's cursor model closely enough that
//! any mature C/C++ parser can be lowered into it: every node has a kind, an
//! identifier spelling, a location, a type signature, an access specifier and
//! ordered children.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Stable handle to a cursor inside its [`CursorTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(u32);

impl CursorId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
    TranslationUnit,
    Namespace,
    StructDecl,
    ClassDecl,
    UnionDecl,
    ClassTemplate,
    EnumDecl,
    FieldDecl,
    Method,
    Constructor,
    Destructor,
    FunctionDecl,
    VarDecl,
    AccessSpecifier,
    LinkageSpec,
    Other,
}

impl CursorKind {
    /// Struct or class declaration, the only kinds that can be reflected
    pub fn is_record(self) -> bool {
        matches!(self, CursorKind::StructDecl | CursorKind::ClassDecl)
    }
}

/// C++ member access. `Invalid` is what non-member declarations carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessSpecifier {
    #[default]
    Invalid,
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Arc<Path>,
    /// 1-based
    pub line: u32,
    /// 1-based
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: Arc<Path>, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Type signature as written and in canonical (fully qualified) form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSignature {
    pub spelling: String,
    pub canonical: String,
}

impl TypeSignature {
    pub fn new(spelling: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            canonical: canonical.into(),
        }
    }

    /// Signature whose canonical form is the spelling itself
    pub fn plain(spelling: impl Into<String>) -> Self {
        let spelling = spelling.into();
        Self {
            canonical: spelling.clone(),
            spelling,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceCursor {
    pub kind: CursorKind,
    pub spelling: String,
    pub location: SourceLocation,
    pub ty: TypeSignature,
    pub access: AccessSpecifier,
    parent: Option<CursorId>,
    children: Vec<CursorId>,
}

impl SourceCursor {
    pub fn parent(&self) -> Option<CursorId> {
        self.parent
    }

    pub fn children(&self) -> &[CursorId] {
        &self.children
    }
}

/// Description of a cursor to be added to a tree
#[derive(Debug, Clone)]
pub struct NewCursor {
    pub kind: CursorKind,
    pub spelling: String,
    pub line: u32,
    pub column: u32,
    pub ty: TypeSignature,
    pub access: AccessSpecifier,
    pub file: Option<Arc<Path>>,
}

impl NewCursor {
    pub fn new(kind: CursorKind, spelling: impl Into<String>) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            line: 1,
            column: 1,
            ty: TypeSignature::default(),
            access: AccessSpecifier::Invalid,
            file: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_type(mut self, ty: TypeSignature) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_access(mut self, access: AccessSpecifier) -> Self {
        self.access = access;
        self
    }

    /// Override the originating file (e.g. a cursor coming from an included header)
    pub fn in_file(mut self, file: Arc<Path>) -> Self {
        self.file = Some(file);
        self
    }
}

/// Result of a visitor callback, mirroring `CXChildVisitResult`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildVisit {
    /// Stop the whole traversal
    Break,
    /// Move on to the next sibling
    Continue,
    /// Visit this cursor's children before its next sibling
    Recurse,
}

/// Arena of cursors for one parsed file. Index 0 is the translation unit.
#[derive(Debug, Clone)]
pub struct CursorTree {
    file: Arc<Path>,
    nodes: Vec<SourceCursor>,
}

impl CursorTree {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        let path: PathBuf = file.into();
        let file: Arc<Path> = Arc::from(path);
        let root = SourceCursor {
            kind: CursorKind::TranslationUnit,
            spelling: file.display().to_string(),
            location: SourceLocation::new(file.clone(), 1, 1),
            ty: TypeSignature::default(),
            access: AccessSpecifier::Invalid,
            parent: None,
            children: Vec::new(),
        };
        Self {
            file,
            nodes: vec![root],
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn root(&self) -> CursorId {
        CursorId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The translation unit is always present
        self.nodes.len() == 1
    }

    /// Append `cursor` as the last child of `parent`
    pub fn push(&mut self, parent: CursorId, cursor: NewCursor) -> CursorId {
        let id = CursorId(self.nodes.len() as u32);
        let file = cursor.file.unwrap_or_else(|| self.file.clone());
        self.nodes.push(SourceCursor {
            kind: cursor.kind,
            spelling: cursor.spelling,
            location: SourceLocation::new(file, cursor.line, cursor.column),
            ty: cursor.ty,
            access: cursor.access,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn get(&self, id: CursorId) -> &SourceCursor {
        &self.nodes[id.index()]
    }

    pub fn children(&self, id: CursorId) -> &[CursorId] {
        &self.nodes[id.index()].children
    }

    /// Pre-order traversal of the descendants of `parent`.
    ///
    /// The visitor receives `(cursor, parent)` and decides whether to descend.
    /// Returns `false` if the traversal was stopped with [`ChildVisit::Break`].
    pub fn visit_children<F>(&self, parent: CursorId, visitor: &mut F) -> bool
    where
        F: FnMut(CursorId, CursorId) -> ChildVisit,
    {
        for &child in self.children(parent) {
            match visitor(child, parent) {
                ChildVisit::Break => return false,
                ChildVisit::Continue => {}
                ChildVisit::Recurse => {
                    if !self.visit_children(child, visitor) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[derive(Error, Debug)]
pub enum FrontEndError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Capability to turn one source file into a cursor tree.
///
/// Implementations wrap a real C/C++ parser; the scanner never inspects
/// source text itself.
pub trait FrontEnd: Sync {
    fn parse(&self, file: &Path, include_dirs: &[PathBuf]) -> Result<CursorTree, FrontEndError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CursorTree, CursorId, CursorId) {
        let mut tree = CursorTree::new("sample.h");
        let root = tree.root();
        let foo = tree.push(root, NewCursor::new(CursorKind::StructDecl, "Foo"));
        tree.push(foo, NewCursor::new(CursorKind::FieldDecl, "a"));
        tree.push(foo, NewCursor::new(CursorKind::FieldDecl, "b"));
        let bar = tree.push(root, NewCursor::new(CursorKind::StructDecl, "Bar"));
        tree.push(bar, NewCursor::new(CursorKind::FieldDecl, "c"));
        (tree, foo, bar)
    }

    #[test]
    fn test_push_links_parent_and_children() {
        let (tree, foo, _) = sample();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.children(foo).len(), 2);
        let a = tree.children(foo)[0];
        assert_eq!(tree.get(a).parent(), Some(foo));
        assert_eq!(tree.get(a).location.file.as_ref(), Path::new("sample.h"));
    }

    #[test]
    fn test_visit_recurse_is_preorder() {
        let (tree, _, _) = sample();
        let mut seen = Vec::new();
        tree.visit_children(tree.root(), &mut |id, _| {
            seen.push(tree.get(id).spelling.clone());
            ChildVisit::Recurse
        });
        assert_eq!(seen, vec!["Foo", "a", "b", "Bar", "c"]);
    }

    #[test]
    fn test_visit_continue_skips_children() {
        let (tree, foo, _) = sample();
        let mut seen = Vec::new();
        tree.visit_children(tree.root(), &mut |id, _| {
            seen.push(tree.get(id).spelling.clone());
            if id == foo {
                ChildVisit::Continue
            } else {
                ChildVisit::Recurse
            }
        });
        assert_eq!(seen, vec!["Foo", "Bar", "c"]);
    }

    #[test]
    fn test_visit_break_stops() {
        let (tree, _, bar) = sample();
        let mut count = 0;
        let finished = tree.visit_children(tree.root(), &mut |id, _| {
            count += 1;
            if id == bar {
                ChildVisit::Break
            } else {
                ChildVisit::Recurse
            }
        });
        assert!(!finished);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new(Arc::from(Path::new("src/foo.h")), 12, 5);
        assert_eq!(loc.to_string(), "src/foo.h:12:5");
    }
}
