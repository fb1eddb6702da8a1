//! Identifier helpers shared by the analyzer and the deconflictor.

use std::path::Path;

use cow_utils::CowUtils;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

/// Words that can never be used as a binding name in module code.
static RESERVED_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "arguments",
        "await",
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "eval",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "implements",
        "import",
        "in",
        "instanceof",
        "interface",
        "let",
        "new",
        "null",
        "package",
        "private",
        "protected",
        "public",
        "return",
        "static",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "undefined",
        "var",
        "void",
        "while",
        "with",
        "yield",
    ]
    .into_iter()
    .collect()
});

static HYPHENATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\w)").expect("hyphen pattern is a valid regex"));

static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^$_a-zA-Z0-9]").expect("identifier pattern is a valid regex"));

/// Check whether `name` is a reserved word in module code
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(name)
}

/// Check whether `name` can be written as a plain identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first == '$' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
        && !is_reserved_word(name)
}

/// Turn an arbitrary string into a legal identifier.
///
/// Hyphenated segments are camel-cased (`lodash-es` becomes `lodashEs`), every
/// remaining character outside `[$_a-zA-Z0-9]` becomes `_`, and a leading digit
/// or a reserved word gets a `_` prefix.
///
/// # Example
///
/// ```rust
/// use rebundle::util::make_legal;
/// assert_eq!(make_legal("lodash-es"), "lodashEs");
/// assert_eq!(make_legal("@scope/pkg"), "_scope_pkg");
/// assert_eq!(make_legal("1st"), "_1st");
/// ```
pub fn make_legal(raw: &str) -> String {
    let camel = HYPHENATED.replace_all(raw, |caps: &regex::Captures<'_>| {
        caps[1].cow_to_ascii_uppercase().into_owned()
    });
    let mut legal = ILLEGAL_CHARS.replace_all(&camel, "_").into_owned();

    let starts_with_digit = legal.chars().next().is_some_and(|c| c.is_ascii_digit());
    if starts_with_digit || is_reserved_word(&legal) {
        legal.insert(0, '_');
    }
    if legal.is_empty() {
        legal.push('_');
    }
    legal
}

/// Name used for a module's anonymous default export and namespace object,
/// derived from the file's basename without its extension.
pub fn module_identifier_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    make_legal(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_legal_camel_cases_hyphens() {
        assert_eq!(make_legal("my-module"), "myModule");
        assert_eq!(make_legal("a-b-c"), "aBC");
    }

    #[test]
    fn test_make_legal_replaces_illegal_characters() {
        assert_eq!(make_legal("@scope/pkg"), "_scope_pkg");
        assert_eq!(make_legal("foo.bar"), "foo_bar");
        assert_eq!(make_legal("$ok_1"), "$ok_1");
    }

    #[test]
    fn test_make_legal_prefixes_digits_and_reserved_words() {
        assert_eq!(make_legal("3d"), "_3d");
        assert_eq!(make_legal("default"), "_default");
        assert_eq!(make_legal("class"), "_class");
        assert_eq!(make_legal(""), "_");
    }

    #[test]
    fn test_module_identifier_name_strips_extension() {
        assert_eq!(module_identifier_name(Path::new("/src/foo.js")), "foo");
        assert_eq!(
            module_identifier_name(Path::new("/src/date-utils.mjs")),
            "dateUtils"
        );
        assert_eq!(module_identifier_name(Path::new("/src/new.js")), "_new");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("$_a1"));
        assert!(!is_valid_identifier("1a"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("let"));
        assert!(!is_valid_identifier(""));
    }
}
