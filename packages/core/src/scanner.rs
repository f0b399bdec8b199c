//! Annotation scanner.
//!
//! Walks one file's cursor tree and associates the declarations that follow
//! directive markers with the active reflected type. The walk follows the
//! libclang visitation protocol: every visited cursor is checked against the
//! active parent first, so leaving a reflected type's body is noticed on the
//! first cursor that belongs elsewhere.

use crate::classifier::classify;
use crate::cursor::{AccessSpecifier, ChildVisit, CursorId, CursorKind, CursorTree};
use crate::error::ScanError;
use crate::markers::Directive;
use crate::store::{FieldDescriptor, FieldKind, MetadataStore};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// Per-file scanner state. The inside variants carry the reflected type's
/// cursor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    AwaitingReflectedType,
    InsideReflectedType { parent: CursorId },
    AwaitingAliasField { parent: CursorId },
    AwaitingFunctionField { parent: CursorId },
}

impl ScanState {
    pub fn active_parent(self) -> Option<CursorId> {
        match self {
            ScanState::InsideReflectedType { parent }
            | ScanState::AwaitingAliasField { parent }
            | ScanState::AwaitingFunctionField { parent } => Some(parent),
            ScanState::Scanning | ScanState::AwaitingReflectedType => None,
        }
    }
}

/// Partial result for a single file
#[derive(Debug, Clone)]
pub struct FileScan {
    pub file: PathBuf,
    pub metadata: MetadataStore,
    pub errors: Vec<ScanError>,
}

impl FileScan {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            metadata: MetadataStore::new(),
            errors: Vec::new(),
        }
    }
}

/// Scan one parsed file. Include paths are recorded relative to `root`.
pub fn scan_tree(tree: &CursorTree, root: &Path) -> FileScan {
    Scanner::new(tree, root).run()
}

struct Scanner<'a> {
    tree: &'a CursorTree,
    root: &'a Path,
    state: ScanState,
    result: FileScan,
}

impl<'a> Scanner<'a> {
    fn new(tree: &'a CursorTree, root: &'a Path) -> Self {
        Self {
            tree,
            root,
            state: ScanState::Scanning,
            result: FileScan::new(tree.file()),
        }
    }

    fn run(mut self) -> FileScan {
        let tree = self.tree;
        tree.visit_children(tree.root(), &mut |cursor, parent| self.visit(cursor, parent));
        self.finish();
        self.result
    }

    fn error(&mut self, error: ScanError) {
        debug!(kind = error.kind.name(), "{}", error);
        self.result.errors.push(error);
    }

    fn visit(&mut self, id: CursorId, parent: CursorId) -> ChildVisit {
        let tree = self.tree;
        let cursor = tree.get(id);

        if let Some(active) = self.state.active_parent() {
            if active != parent {
                if !matches!(self.state, ScanState::InsideReflectedType { .. }) {
                    self.error(ScanError::incomplete(
                        format!(
                            "Reflected type '{}' ended while a directive was still pending",
                            tree.get(active).spelling
                        ),
                        cursor.location.clone(),
                    ));
                }
                self.state = ScanState::Scanning;
            }
        }

        if let Some(directive) = Directive::from_spelling(&cursor.spelling) {
            self.apply_directive(directive, id);
            return ChildVisit::Continue;
        }

        match self.state {
            ScanState::Scanning => ChildVisit::Recurse,
            ScanState::AwaitingReflectedType => self.bind_reflected_type(id),
            ScanState::InsideReflectedType { parent } => {
                self.visit_member(id, parent, FieldKind::Plain, false)
            }
            ScanState::AwaitingAliasField { parent } => {
                self.visit_member(id, parent, FieldKind::AliasRef, true)
            }
            ScanState::AwaitingFunctionField { parent } => {
                self.visit_member(id, parent, FieldKind::Method, true)
            }
        }
    }

    fn apply_directive(&mut self, directive: Directive, id: CursorId) {
        let tree = self.tree;
        let location = tree.get(id).location.clone();
        match (directive, self.state) {
            (Directive::ReflectType, ScanState::Scanning) => {
                self.state = ScanState::AwaitingReflectedType;
            }
            (Directive::ReflectType, _) => {
                self.error(ScanError::structural(
                    "Cannot reflect nested types; a reflected type is already pending or open",
                    location,
                ));
            }
            (Directive::AliasRef, ScanState::InsideReflectedType { parent }) => {
                self.state = ScanState::AwaitingAliasField { parent };
            }
            (Directive::Method, ScanState::InsideReflectedType { parent }) => {
                self.state = ScanState::AwaitingFunctionField { parent };
            }
            (Directive::AliasRef | Directive::Method, _) => {
                self.error(ScanError::structural(
                    format!(
                        "Directive {} is only valid directly inside a reflected type",
                        directive.marker()
                    ),
                    location,
                ));
            }
        }
    }

    fn bind_reflected_type(&mut self, id: CursorId) -> ChildVisit {
        let tree = self.tree;
        let cursor = tree.get(id);
        let accessible = matches!(
            cursor.access,
            AccessSpecifier::Public | AccessSpecifier::Invalid
        );

        if !cursor.kind.is_record() || !accessible {
            let message = if cursor.kind.is_record() {
                format!("Ignoring reflected type '{}': non-public types cannot be reflected", cursor.spelling)
            } else {
                format!(
                    "Ignoring reflected declaration '{}': only public structs and classes can be reflected",
                    cursor.spelling
                )
            };
            self.error(ScanError::accessibility(message, cursor.location.clone()));
            self.state = ScanState::Scanning;
            return ChildVisit::Continue;
        }

        debug!(ty = %cursor.ty.canonical, location = %cursor.location, "Reflecting type");
        self.state = ScanState::InsideReflectedType { parent: id };
        ChildVisit::Recurse
    }

    fn visit_member(&mut self, id: CursorId, parent: CursorId, kind: FieldKind, directed: bool) -> ChildVisit {
        let tree = self.tree;
        let cursor = tree.get(id);
        let expected = if kind == FieldKind::Method {
            CursorKind::Method
        } else {
            CursorKind::FieldDecl
        };
        let accepted = cursor.access == AccessSpecifier::Public && cursor.kind == expected;

        self.state = ScanState::InsideReflectedType { parent };

        if !accepted {
            if directed {
                self.error(ScanError::invalid_member(
                    format!(
                        "Directive precedes '{}', which is not a public {}",
                        cursor.spelling,
                        if kind == FieldKind::Method { "member method" } else { "data member" }
                    ),
                    cursor.location.clone(),
                ));
            }
            return ChildVisit::Continue;
        }

        let type_name = tree.get(parent).ty.canonical.clone();
        trace!(ty = %type_name, field = %cursor.spelling, ?kind, "Captured field");

        let include = relative_include(self.root, &cursor.location.file);
        self.result.metadata.add_field_from(
            &type_name,
            FieldDescriptor::new(cursor.spelling.clone(), kind),
            include,
        );

        for pattern in classify(&cursor.ty.spelling) {
            self.result.metadata.aux.record(pattern);
        }

        ChildVisit::Continue
    }

    fn finish(&mut self) {
        let tree = self.tree;
        match self.state {
            ScanState::AwaitingAliasField { parent } | ScanState::AwaitingFunctionField { parent } => {
                let cursor = tree.get(parent);
                self.error(ScanError::incomplete(
                    format!(
                        "Reflected type '{}' ended while a directive was still pending",
                        cursor.spelling
                    ),
                    cursor.location.clone(),
                ));
            }
            ScanState::AwaitingReflectedType => {
                let location = tree.get(tree.root()).location.clone();
                self.error(ScanError::structural(
                    "Reflect-type directive is not followed by any declaration",
                    location,
                ));
            }
            ScanState::Scanning | ScanState::InsideReflectedType { .. } => {}
        }
        self.state = ScanState::Scanning;
    }
}

/// `/`-separated path of `file` relative to `root`, or the full path when
/// `file` lives outside the root
pub fn relative_include(root: &Path, file: &Path) -> String {
    match file.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file.to_string_lossy().replace('\\', "/"),
    }
}
