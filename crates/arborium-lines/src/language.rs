//! Resolving a code block's language and diff mode.

use arborium_hast::Element;

const DIFF_MARKER: &str = "-diff";
const CLASS_PREFIX: &str = "language-";

/// Language identifier and diff flag derived from a language token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageSpec {
    pub lang: Option<String>,
    pub diff: bool,
}

/// Split a language token such as `rust-diff` into language and diff flag.
///
/// Only the first `-diff` is considered, and only if something precedes it:
/// `-diff` on its own is a language called `-diff`.
pub fn parse_language(token: Option<&str>) -> LanguageSpec {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return LanguageSpec::default();
    };

    match token.find(DIFF_MARKER) {
        Some(pos) if pos > 0 => LanguageSpec {
            lang: Some(token[..pos].to_string()),
            diff: true,
        },
        _ => LanguageSpec {
            lang: Some(token.to_string()),
            diff: false,
        },
    }
}

/// Find the language token on a `code` element.
///
/// `data-language` wins; otherwise the first `language-*` class, lower-cased.
pub fn language_token(code: &Element) -> Option<String> {
    if let Some(lang) = code.attr("data-language").filter(|l| !l.is_empty()) {
        return Some(lang.to_string());
    }

    code.classes()
        .find_map(|class| class.strip_prefix(CLASS_PREFIX))
        .filter(|lang| !lang.is_empty())
        .map(str::to_lowercase)
}
