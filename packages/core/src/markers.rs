/// Identifier the begin-reflected-type macro expands to
pub const REFLECT_TYPE_MARKER: &str = "HEARTGEN___SERIALIZE_NEXT_SYMBOL_STRUCT";
/// Identifier the aliased-reference macro expands to
pub const ALIAS_REF_MARKER: &str = "HEARTGEN___SERIALIZE_NEXT_SYMBOL_AS_REF";
/// Identifier the member-method macro expands to
pub const METHOD_MARKER: &str = "HEARTGEN___SERIALIZE_NEXT_SYMBOL_AS_MEMB_FUNCTION";

/// Generator-only annotation recognised by exact cursor spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    ReflectType,
    AliasRef,
    Method,
}

impl Directive {
    pub fn from_spelling(spelling: &str) -> Option<Self> {
        match spelling {
            REFLECT_TYPE_MARKER => Some(Directive::ReflectType),
            ALIAS_REF_MARKER => Some(Directive::AliasRef),
            METHOD_MARKER => Some(Directive::Method),
            _ => None,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Directive::ReflectType => REFLECT_TYPE_MARKER,
            Directive::AliasRef => ALIAS_REF_MARKER,
            Directive::Method => METHOD_MARKER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_identity() {
        assert_eq!(
            Directive::from_spelling("HEARTGEN___SERIALIZE_NEXT_SYMBOL_STRUCT"),
            Some(Directive::ReflectType)
        );
        assert_eq!(Directive::from_spelling("HEARTGEN___SERIALIZE_NEXT_SYMBOL_STRUCTS"), None);
        assert_eq!(Directive::from_spelling("SERIALIZE_STRUCT"), None);
    }

    #[test]
    fn test_marker_roundtrip() {
        for directive in [Directive::ReflectType, Directive::AliasRef, Directive::Method] {
            assert_eq!(Directive::from_spelling(directive.marker()), Some(directive));
        }
    }
}
