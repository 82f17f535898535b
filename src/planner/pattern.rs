//! LIKE pattern translation
//!
//! SQL wildcards become index wildcards: `%` to `*`, `_` to `?`. A
//! backslash-escaped `\%` or `\_` is a literal character, and so is any other
//! escaped character, the same way string literals unescape. Characters the
//! index syntax reserves are escaped so they match themselves.

use crate::index::escape_term;

/// Translates the body of a LIKE string literal (quotes already stripped) to
/// an index wildcard pattern.
pub fn translate_like_pattern(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 4);
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '\\' => match chars.next() {
                Some('%') => out.push('%'),
                Some('_') => out.push('_'),
                Some('\'') => out.push('\''),
                Some('\\') => out.push_str(r"\\"),
                Some(other) => push_literal(&mut out, other),
                None => out.push_str(r"\\"),
            },
            other => push_literal(&mut out, other),
        }
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&escape_term(c.encode_utf8(&mut buf)));
}

/// Whether the translated pattern contains an unescaped wildcard
pub fn has_wildcard(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '?' => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_percent() {
        let pattern = translate_like_pattern("report%");
        assert_eq!(pattern, "report*");
        assert!(pattern.ends_with('*'));
    }

    #[test]
    fn test_underscore_single_char() {
        assert_eq!(translate_like_pattern("a_c"), "a?c");
    }

    #[test]
    fn test_escaped_wildcards_are_literal() {
        let pattern = translate_like_pattern(r"a\%b");
        assert_eq!(pattern, "a%b");
        assert!(!has_wildcard(&pattern));
        assert_eq!(translate_like_pattern(r"x\_y"), "x_y");
    }

    #[test]
    fn test_reserved_characters_escaped() {
        assert_eq!(translate_like_pattern("a*b?"), r"a\*b\?");
        assert_eq!(translate_like_pattern("q:1 %"), r"q\:1\ *");
        assert!(!has_wildcard(r"a\*b\?"));
    }

    #[test]
    fn test_backslash_handling() {
        assert_eq!(translate_like_pattern(r"a\\b"), r"a\\b");
        assert_eq!(translate_like_pattern(r"a\'b"), "a'b");
        assert_eq!(translate_like_pattern(r"end\"), r"end\\");
    }

    #[test]
    fn test_unknown_escape_is_literal_character() {
        assert_eq!(translate_like_pattern(r"a\b"), "ab");
        assert_eq!(translate_like_pattern(r"a\*"), r"a\*");
        assert!(!has_wildcard(&translate_like_pattern(r"a\*")));
    }

    proptest! {
        #[test]
        fn prop_idempotent_without_wildcards(body in "[a-zA-Z0-9.,#@]{0,24}") {
            let once = translate_like_pattern(&body);
            prop_assert_eq!(&once, &body);
            prop_assert_eq!(translate_like_pattern(&once), once.clone());
            prop_assert!(!has_wildcard(&once));
        }

        #[test]
        fn prop_every_percent_becomes_wildcard(prefix in "[a-z]{0,8}", suffix in "[a-z]{0,8}") {
            let pattern = translate_like_pattern(&format!("{}%{}", prefix, suffix));
            prop_assert_eq!(pattern, format!("{}*{}", prefix, suffix));
        }
    }
}
