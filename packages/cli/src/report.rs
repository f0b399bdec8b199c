//! Terminal rendering of scan errors.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use colored::Colorize;
use heartgen_core::ScanError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Char offset of a 1-based line/column (column counted in bytes)
fn char_offset(source: &str, line: u32, column: u32) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line as usize {
            let mut byte = (column.max(1) - 1) as usize;
            byte = byte.min(text.len());
            while !text.is_char_boundary(byte) {
                byte -= 1;
            }
            return offset + text[..byte].chars().count();
        }
        offset += text.chars().count();
    }
    offset
}

/// Length in chars of the identifier starting at `offset`, at least 1
fn token_len(source: &str, offset: usize) -> usize {
    source
        .chars()
        .skip(offset)
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .count()
        .max(1)
}

/// Render one error against the file it points into
pub fn format_scan_error(error: &ScanError, source: &str, color: bool) -> String {
    let filename = error.location.file.display().to_string();
    let start = char_offset(source, error.location.line, error.location.column);
    let end = start + token_len(source, start);

    let mut output = Vec::new();
    let report = Report::build(ReportKind::Error, filename.as_str(), start)
        .with_config(Config::default().with_color(color))
        .with_code(error.kind.name())
        .with_message(&error.message)
        .with_label(
            Label::new((filename.as_str(), start..end))
                .with_color(Color::Red)
                .with_message(error.kind.name()),
        )
        .finish();

    if report
        .write((filename.as_str(), Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

/// Print every error to stderr, with a source snippet when the file is readable
pub fn print_scan_errors(errors: &[ScanError]) {
    let mut sources: HashMap<PathBuf, Option<String>> = HashMap::new();

    for error in errors {
        let path = error.location.file.to_path_buf();
        let source = sources
            .entry(path.clone())
            .or_insert_with(|| fs::read_to_string(&path).ok());

        eprintln!(
            "  {} {} {}",
            "✗".red(),
            error.location.to_string().bold(),
            error.message
        );
        if let Some(source) = source {
            eprintln!("{}", format_scan_error(error, source, true));
        }
    }
}
