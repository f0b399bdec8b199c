//! Generator pipeline tests over a real directory tree.
//!
//! Sources are written in a tiny line format understood by `OutlineFrontEnd`,
//! so these tests exercise discovery, merging and the write-if-changed commit
//! without depending on a C++ parser:
//!
//!   reflect                 reflect-type marker
//!   struct NAME [private]   record, opened until `end`
//!   field TYPE NAME [private]
//!   alias / invoke          alias-ref and method markers
//!   method NAME
//!   end

use heartgen_core::{
    AccessSpecifier, CursorId, CursorKind, CursorTree, FrontEnd, FrontEndError, GenError,
    Generator, GeneratorOptions, NewCursor, ScanErrorKind, TypeSignature, WriteOutcome,
    ALIAS_REF_MARKER, METHOD_MARKER, REFLECT_TYPE_MARKER,
};
use std::fs;
use std::path::{Path, PathBuf};

struct OutlineFrontEnd;

impl FrontEnd for OutlineFrontEnd {
    fn parse(&self, file: &Path, _include_dirs: &[PathBuf]) -> Result<CursorTree, FrontEndError> {
        let source = fs::read_to_string(file).map_err(|source| FrontEndError::Read {
            path: file.to_path_buf(),
            source,
        })?;

        let mut tree = CursorTree::new(file);
        let root = tree.root();
        let mut stack: Vec<CursorId> = vec![root];

        for (index, line) in source.lines().enumerate() {
            let line_no = index as u32 + 1;
            let words: Vec<&str> = line.split_whitespace().collect();
            let parent = *stack.last().unwrap();
            let access = |private: bool| {
                if private {
                    AccessSpecifier::Private
                } else if parent == root {
                    AccessSpecifier::Invalid
                } else {
                    AccessSpecifier::Public
                }
            };

            match words.as_slice() {
                [] => {}
                ["reflect"] => {
                    let kind = if parent == root { CursorKind::FunctionDecl } else { CursorKind::Method };
                    tree.push(parent, NewCursor::new(kind, REFLECT_TYPE_MARKER).at(line_no, 1));
                }
                ["alias"] | ["invoke"] => {
                    let marker = if words[0] == "alias" { ALIAS_REF_MARKER } else { METHOD_MARKER };
                    tree.push(
                        parent,
                        NewCursor::new(CursorKind::Method, marker)
                            .at(line_no, 1)
                            .with_access(AccessSpecifier::Public),
                    );
                }
                ["struct", name, rest @ ..] => {
                    let access = access(rest == ["private"]);
                    let id = tree.push(
                        parent,
                        NewCursor::new(CursorKind::StructDecl, *name)
                            .at(line_no, 8)
                            .with_access(access)
                            .with_type(TypeSignature::plain(*name)),
                    );
                    stack.push(id);
                }
                ["field", ty, name, rest @ ..] => {
                    let access = access(rest == ["private"]);
                    tree.push(
                        parent,
                        NewCursor::new(CursorKind::FieldDecl, *name)
                            .at(line_no, 5)
                            .with_access(access)
                            .with_type(TypeSignature::plain(*ty)),
                    );
                }
                ["method", name] => {
                    tree.push(
                        parent,
                        NewCursor::new(CursorKind::Method, *name)
                            .at(line_no, 5)
                            .with_access(AccessSpecifier::Public),
                    );
                }
                ["end"] if stack.len() > 1 => {
                    stack.pop();
                }
                _ => {
                    return Err(FrontEndError::Parse {
                        path: file.to_path_buf(),
                        message: format!("unexpected line {}: {}", line_no, line),
                    })
                }
            }
        }

        Ok(tree)
    }
}

fn write_source(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn generator(root: &Path) -> Generator<OutlineFrontEnd> {
    Generator::new(GeneratorOptions::new(root), OutlineFrontEnd)
}

const FOO: &str = "reflect\nstruct Foo\nfield int a\nfield int b\nend\n";

#[test]
fn test_second_run_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "src/foo.h", FOO);

    let first = generator(dir.path()).run().unwrap();
    assert_eq!(first.outcome, Some(WriteOutcome::Written));
    assert!(first.succeeded());
    let written = fs::read(&first.output_path).unwrap();

    let second = generator(dir.path()).run().unwrap();
    assert_eq!(second.outcome, Some(WriteOutcome::Unchanged));
    assert_eq!(fs::read(&second.output_path).unwrap(), written);
}

#[test]
fn test_output_lands_in_gen_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "src/foo.h", FOO);

    let report = generator(dir.path()).run().unwrap();

    assert_eq!(report.output_path, dir.path().join("gen/reflection.heartgen.cpp"));
    let output = fs::read_to_string(&report.output_path).unwrap();
    assert!(output.contains("#include \"src/foo.h\"\n"));
    assert!(output.contains(
        "    BEGIN_SERIALIZE_TYPE(Foo)\n        SERIALIZE_FIELD(Foo, a)\n        SERIALIZE_FIELD(Foo, b)\n    END_SERIALIZE_TYPE(Foo)\n"
    ));
}

#[test]
fn test_renamed_field_changes_one_line() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "src/foo.h", FOO);
    let before = generator(dir.path()).run().unwrap().rendered;

    write_source(dir.path(), "src/foo.h", &FOO.replace("field int b", "field int renamed"));
    let report = generator(dir.path()).run().unwrap();
    assert_eq!(report.outcome, Some(WriteOutcome::Written));

    let before: Vec<&str> = before.lines().collect();
    let after: Vec<&str> = report.rendered.lines().collect();
    assert_eq!(before.len(), after.len());
    let changed: Vec<_> = before.iter().zip(&after).filter(|(b, a)| b != a).collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].1.trim(), "SERIALIZE_FIELD(Foo, renamed)");
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..12 {
        write_source(
            dir.path(),
            &format!("src/type{:02}.h", i),
            &format!(
                "reflect\nstruct Type{i}\nfield SerializedString<{cap}> name\nfield hrt::vector<Type{i}> children\nalias\nfield Type{i}* parent\nend\n",
                i = i,
                cap = 8 * (i % 3 + 1)
            ),
        );
    }

    let parallel = Generator::new(GeneratorOptions::new(dir.path()).with_parallel(true), OutlineFrontEnd)
        .render()
        .unwrap();
    let sequential = Generator::new(GeneratorOptions::new(dir.path()).with_parallel(false), OutlineFrontEnd)
        .render()
        .unwrap();

    assert_eq!(parallel.files_scanned, 12);
    assert_eq!(parallel.rendered, sequential.rendered);
    let names: Vec<_> = parallel.metadata.types().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names[0], "Type0");
    assert_eq!(names[1], "Type1");
    assert_eq!(names[11], "Type11");
}

#[test]
fn test_same_type_in_two_files_keeps_first_field() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "a.h", "reflect\nstruct Shared\nalias\nfield Node* link\nend\n");
    write_source(dir.path(), "b.cpp", "reflect\nstruct Shared\nfield Node* link\nfield int extra\nend\n");

    let report = generator(dir.path()).render().unwrap();

    let shared = report.metadata.get("Shared").unwrap();
    assert_eq!(shared.fields.len(), 2);
    assert!(shared.field("link").unwrap().is_alias_ref());
    assert_eq!(report.rendered.matches("link)").count(), 1);
    assert!(report.metadata.includes.contains("a.h"));
    assert!(report.metadata.includes.contains("b.cpp"));
}

#[test]
fn test_generated_and_foreign_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "src/foo.h", FOO);
    write_source(dir.path(), "src/notes.txt", "not a source file");
    write_source(dir.path(), "src/old.heartgen.h", "garbage that would not parse");

    let heartgen = generator(dir.path());
    let files = heartgen.discover().unwrap();
    assert_eq!(files, vec![dir.path().join("src/foo.h")]);

    let report = heartgen.run().unwrap();
    assert!(report.succeeded());
    // the output itself is never scanned
    assert_eq!(heartgen.discover().unwrap().len(), 1);
}

#[test]
fn test_front_end_failure_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "src/bad.h", "reflect\n%% broken\n");
    write_source(dir.path(), "src/foo.h", FOO);

    let report = generator(dir.path()).run().unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ScanErrorKind::FrontEnd);
    assert!(report.errors[0].location.file.ends_with("src/bad.h"));
    assert!(report.metadata.get("Foo").is_some());
    assert_eq!(report.outcome, Some(WriteOutcome::Written));
}

#[test]
fn test_scan_errors_do_not_stop_generation() {
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "src/mixed.h",
        "reflect\nstruct Foo\nalias\nfield int hidden private\nfield int a\nend\nreflect\n",
    );

    let report = generator(dir.path()).run().unwrap();

    let kinds: Vec<_> = report.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ScanErrorKind::InvalidMember, ScanErrorKind::StructuralDirective]);
    assert_eq!(report.type_count(), 1);
    assert!(!report.succeeded());
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    match generator(&missing).run() {
        Err(GenError::RootNotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected RootNotFound, got {:?}", other.map(|r| r.files_scanned)),
    }
}

#[test]
fn test_custom_output_path() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "foo.h", FOO);

    let options = GeneratorOptions::new(dir.path()).with_output("build/out.heartgen.cpp");
    let report = Generator::new(options, OutlineFrontEnd).run().unwrap();

    assert!(dir.path().join("build/out.heartgen.cpp").is_file());
    assert_eq!(report.outcome, Some(WriteOutcome::Written));
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_recorded_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "foo.h", FOO);
    std::os::unix::fs::symlink(dir.path().join("missing.h"), dir.path().join("dangling.h")).unwrap();

    let report = generator(dir.path()).run().unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ScanErrorKind::FrontEnd);
    assert!(report.errors[0].location.file.ends_with("dangling.h"));
    assert_eq!(report.errors[0].location.line, 1);
    assert!(!report.succeeded());
    assert!(report.metadata.get("Foo").is_some());
    assert_eq!(report.outcome, Some(WriteOutcome::Written));
    assert!(report.output_path.is_file());
}

#[test]
fn test_duplicate_only_file_adds_no_include() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "a.h", FOO);
    write_source(dir.path(), "b.h", FOO);

    let report = generator(dir.path()).render().unwrap();

    assert_eq!(report.metadata.includes.iter().collect::<Vec<_>>(), vec!["a.h"]);
    assert!(!report.rendered.contains("#include \"b.h\""));
}

#[test]
fn test_output_outside_generated_naming_is_not_rescanned() {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "src/foo.h", FOO);

    // a non-canonical root against an absolute output path
    let root = dir.path().join("src/..");
    let output = dir.path().join("reflection.cpp");
    let heartgen = Generator::new(GeneratorOptions::new(&root).with_output(&output), OutlineFrontEnd);

    let first = heartgen.run().unwrap();
    assert_eq!(first.outcome, Some(WriteOutcome::Written));
    assert!(output.is_file());

    assert_eq!(heartgen.discover().unwrap(), vec![root.join("src/foo.h")]);
    let second = heartgen.run().unwrap();
    assert!(second.succeeded());
    assert_eq!(second.files_scanned, 1);
    assert_eq!(second.outcome, Some(WriteOutcome::Unchanged));
}
