//! Textual stand-in for the codegen preprocessor pass.
//!
//! With `__HEART_CODEGEN_ACTIVE` defined, the runtime header turns the
//! directive macros into marker declarations and makes `HIDE_FROM_CODEGEN`
//! swallow its argument. Both expansions are applied here. Line breaks are
//! kept so every cursor still reports its original line.

use heartgen_core::{ALIAS_REF_MARKER, METHOD_MARKER, REFLECT_TYPE_MARKER};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;
use tracing::warn;

/// Defined by the build while the generator parses sources
pub const CODEGEN_ACTIVE_DEFINE: &str = "__HEART_CODEGEN_ACTIVE";
pub const HIDE_MACRO: &str = "HIDE_FROM_CODEGEN";

/// Directive macro names and the marker each one expands to
pub const DIRECTIVE_MACROS: &[(&str, &str)] = &[
    ("SERIALIZE_STRUCT", REFLECT_TYPE_MARKER),
    ("SERIALIZE_AS_REF", ALIAS_REF_MARKER),
    ("SERIALIZE_MEMBER_METHOD", METHOD_MARKER),
];

static DIRECTIVE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(SERIALIZE_STRUCT|SERIALIZE_AS_REF|SERIALIZE_MEMBER_METHOD)\s*\(\s*\)")
        .expect("directive call pattern")
});
static HIDE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bHIDE_FROM_CODEGEN\s*\(").expect("hide call pattern"));

/// Apply the codegen-mode macro expansions to `source`
pub fn prepare_source(source: &str) -> String {
    let directives = directive_lines(source);
    let hidden = hidden_regions(source, &directives);
    let blanked = blank_regions(source, &hidden);
    expand_directives(&blanked, &directives)
}

/// Byte ranges of preprocessor lines, continuations included
fn directive_lines(source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut offset = 0;
    let mut continued = false;

    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let body = line.trim_end_matches(['\n', '\r']);
        let is_directive = continued || body.trim_start().starts_with('#');
        continued = is_directive && body.ends_with('\\');
        if is_directive {
            ranges.push(start..offset);
        }
    }

    ranges
}

fn hidden_regions(source: &str, directives: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut from = 0;

    while let Some(found) = HIDE_CALL.find_at(source, from) {
        from = found.end();
        if directives.iter().any(|line| line.contains(&found.start())) {
            continue;
        }

        match closing_paren(source, found.end()) {
            Some(end) => {
                let end = swallow_semicolon(source, end);
                regions.push(found.start()..end);
                from = end;
            }
            None => {
                warn!(offset = found.start(), "Unterminated {} left in place", HIDE_MACRO);
            }
        }
    }

    regions
}

/// Offset just past the `)` matching an already opened `(`
fn closing_paren(source: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, byte) in source.as_bytes()[from..].iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// A hidden member declaration leaves a stray `;` the parser would reject
fn swallow_semicolon(source: &str, end: usize) -> usize {
    let rest = &source[end..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    if trimmed.starts_with(';') {
        end + (rest.len() - trimmed.len()) + 1
    } else {
        end
    }
}

/// Replace region contents with spaces of equal byte length, keeping newlines
fn blank_regions(source: &str, regions: &[Range<usize>]) -> String {
    if regions.is_empty() {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len());
    let mut regions = regions.iter().peekable();

    for (offset, ch) in source.char_indices() {
        while regions.peek().map_or(false, |r| offset >= r.end) {
            regions.next();
        }
        let hidden = regions.peek().map_or(false, |r| r.contains(&offset));
        if hidden && ch != '\n' {
            out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }

    out
}

fn expand_directives(source: &str, directives: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(source.len() + 64);
    let mut offset = 0;
    let mut directives = directives.iter().peekable();

    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        if directives.peek().map_or(false, |r| r.start == start) {
            directives.next();
            out.push_str(line);
            continue;
        }

        let expanded = DIRECTIVE_CALL.replace_all(line, |caps: &Captures| {
            let marker = DIRECTIVE_MACROS
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or(REFLECT_TYPE_MARKER, |(_, marker)| *marker);
            format!("void {}();", marker)
        });
        out.push_str(&expanded);
    }

    out
}
