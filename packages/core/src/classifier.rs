//! Lexical detection of template instantiations that need their own
//! registration blocks.
//!
//! Matching is textual only. `Foo<hrt::vector<int>>` reports a sequence whose
//! element text is `int>` because the element capture runs to the last `>`.
//! There is no semantic type resolution behind this.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Template name of the fixed-capacity string
pub const FIXED_STRING_TEMPLATE: &str = "SerializedString";
/// Template name of the growable sequence
pub const SEQUENCE_TEMPLATE: &str = "hrt::vector";

static FIXED_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SerializedString<\s*(\d+)\s*>").expect("fixed string pattern"));
static SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"hrt::vector<(.+)>").expect("sequence pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePattern {
    /// `SerializedString<N>`
    FixedString(u32),
    /// `hrt::vector<T>`
    Sequence(String),
}

/// Every known template shape found in `type_spelling`
pub fn classify(type_spelling: &str) -> Vec<TypePattern> {
    let mut patterns = Vec::new();

    if let Some(caps) = FIXED_STRING.captures(type_spelling) {
        match caps[1].parse::<u32>() {
            Ok(capacity) => patterns.push(TypePattern::FixedString(capacity)),
            Err(_) => warn!(ty = %type_spelling, "Ignoring string capacity that does not fit in u32"),
        }
    }

    if let Some(caps) = SEQUENCE.captures(type_spelling) {
        patterns.push(TypePattern::Sequence(caps[1].to_string()));
    }

    patterns
}
