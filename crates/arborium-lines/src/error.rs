//! Errors raised while transforming code blocks.
//!
//! Every error is fatal for the document being transformed: there is no way
//! to skip a single offending block.

use thiserror::Error;

/// Errors reported by the injected highlighter.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum HighlightError {
    /// The highlighter has no grammar for this language.
    #[error("unsupported language: {0}")]
    #[diagnostic(code(arborium_lines::unsupported_language))]
    UnsupportedLanguage(String),

    /// The requested highlighter was not compiled in.
    #[error("highlighter not available: {0}")]
    #[diagnostic(
        code(arborium_lines::highlighter_unavailable),
        help("rebuild arborium-lines with `--features arborium`")
    )]
    Unavailable(String),

    /// Any other highlighter failure.
    #[error("highlighting failed: {0}")]
    #[diagnostic(code(arborium_lines::highlight_failed))]
    Failed(String),
}

/// Errors from transforming a code block or a document.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum Error {
    /// The `pre` element does not wrap exactly one `code` element holding
    /// exactly one text node.
    #[error("malformed code block: {0}")]
    #[diagnostic(
        code(arborium_lines::shape),
        help("a code block must be `<pre><code>text</code></pre>` with no other children")
    )]
    Shape(String),

    /// The code block's meta annotation could not be decoded.
    #[error("invalid code block meta: {0}")]
    #[diagnostic(
        code(arborium_lines::meta),
        help("meta is a JSON5 object, e.g. `{{ lineNumbers: true, file: 'main.rs' }}`")
    )]
    MetaParse(String),

    /// Diff mode is on and a line doesn't start with ` `, `-` or `+`.
    #[error("invalid diff symbol {symbol:?} on line {line}")]
    #[diagnostic(
        code(arborium_lines::diff_symbol),
        help("every line of a `-diff` code block must start with ' ', '-' or '+'")
    )]
    DiffSymbol { line: usize, symbol: char },

    /// The highlighter produced a different number of lines than the source has.
    #[error("Line count did not match between text ({source_lines}) and rendered hast ({rendered_lines}).")]
    #[diagnostic(code(arborium_lines::line_count))]
    LineCountMismatch {
        source_lines: usize,
        rendered_lines: usize,
    },

    /// The highlighter's output doesn't have a `code` element where expected.
    #[error("unexpected highlighter output: {0}")]
    #[diagnostic(code(arborium_lines::highlight_shape))]
    HighlightShape(String),

    /// The content digest doesn't match the pinned `contentHash`.
    #[error(
        "Content hash mismatch. '{actual}' did not match expected hash: '{expected}'. \
         Update or remove the 'contentHash' meta property in the code block to continue."
    )]
    #[diagnostic(code(arborium_lines::content_hash))]
    IntegrityMismatch { actual: String, expected: String },

    /// The injected highlighter failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Highlight(#[from] HighlightError),

    /// A synchronous transform was driven with a highlighter that suspended.
    #[error("highlighter yielded during a synchronous transform")]
    #[diagnostic(
        code(arborium_lines::highlighter_yielded),
        help("use `AsyncCodeBlocks` with highlighters that need to await")
    )]
    HighlighterYielded,

    /// The HTML front end failed to parse its input.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Html(#[from] arborium_hast::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_message_names_both_digests() {
        let err = Error::IntegrityMismatch {
            actual: "abc".into(),
            expected: "def".into(),
        };
        assert_eq!(
            err.to_string(),
            "Content hash mismatch. 'abc' did not match expected hash: 'def'. \
             Update or remove the 'contentHash' meta property in the code block to continue."
        );
    }

    #[test]
    fn test_line_count_message() {
        let err = Error::LineCountMismatch {
            source_lines: 3,
            rendered_lines: 2,
        };
        assert_eq!(
            err.to_string(),
            "Line count did not match between text (3) and rendered hast (2)."
        );
    }

    #[test]
    fn test_diff_symbol_message_names_line() {
        let err = Error::DiffSymbol {
            line: 4,
            symbol: 'x',
        };
        assert_eq!(err.to_string(), "invalid diff symbol 'x' on line 4");
    }
}
