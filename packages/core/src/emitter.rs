//! Indentation-aware line writer.
//!
//! Scopes are RAII guards: opening one writes the opening line and indents,
//! dropping it dedents and writes the closing line. A `?` inside a scope
//! therefore can't leave the writer at the wrong depth.

use std::ops::{Deref, DerefMut};

const DEFAULT_INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct CodeWriter {
    lines: Vec<String>,
    depth: usize,
    indent: String,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::with_indent(DEFAULT_INDENT)
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            indent: indent.to_string(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Emit `text` at the current depth
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.blank();
            return;
        }
        let mut line = self.indent.repeat(self.depth);
        line.push_str(text);
        self.lines.push(line);
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Write `open`, indent, and return a guard that writes `close` (if any)
    /// once dropped
    pub fn scope(&mut self, open: impl AsRef<str>, close: Option<String>) -> Scope<'_> {
        self.line(open);
        self.depth += 1;
        Scope {
            writer: self,
            close,
        }
    }

    /// `header` followed by a braced body
    pub fn block(&mut self, header: impl AsRef<str>) -> Scope<'_> {
        self.line(header);
        self.scope("{", Some("}".to_string()))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Newline-terminated text of every emitted line
    pub fn finish(self) -> String {
        let mut output = String::new();
        for line in &self.lines {
            output.push_str(line);
            output.push('\n');
        }
        output
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// An open indentation level. Derefs to the underlying writer so scopes nest.
pub struct Scope<'w> {
    writer: &'w mut CodeWriter,
    close: Option<String>,
}

impl Deref for Scope<'_> {
    type Target = CodeWriter;

    fn deref(&self) -> &CodeWriter {
        self.writer
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut CodeWriter {
        self.writer
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.writer.depth -= 1;
        if let Some(close) = self.close.take() {
            self.writer.line(close);
        }
    }
}
