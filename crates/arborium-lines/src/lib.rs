//! Line numbers, diff markers, content pinning and folding for highlighted
//! code blocks.
//!
//! This crate post-processes `pre > code` blocks in an HTML tree. For each
//! block it:
//!
//! 1. resolves the language from `data-language` or a `language-*` class; a
//!    `-diff` suffix (`rust-diff`) turns on diff mode,
//! 2. decodes the block's meta annotation (a JSON5 object such as
//!    `{ lineNumbers: true, file: 'main.rs' }`),
//! 3. splits the text into lines, stripping the leading ` `/`-`/`+` column in
//!    diff mode and numbering lines if asked to,
//! 4. checks the content against a pinned `contentHash` (SHA-1),
//! 5. hands the text to an injected [`Highlight`] implementation, and
//! 6. merges the highlighter's per-line spans with the per-line metadata by
//!    position, rebuilding fold placeholder lines (`    …`) on the way.
//!
//! Highlighting itself is not done here. The [`PlainHighlighter`] renders
//! untokenized lines; with the `arborium` feature, `ArboriumHighlighter`
//! uses arborium's tree-sitter grammars.
//!
//! # Example
//!
//! ```rust
//! use arborium_lines::{PlainHighlighter, SyncCodeBlocks};
//!
//! let html = r#"<pre><code class="language-rust" data-meta="{ lineNumbers: true, lineNumbersOffset: 9 }">let a = 1;
//! let b = 2;</code></pre>"#;
//!
//! let mut blocks = SyncCodeBlocks::new(PlainHighlighter);
//! let (out, count) = blocks.transform_html(html).unwrap();
//! assert_eq!(count, 1);
//! assert!(out.contains(r#"<span class="line" data-line-number="9" data-line-number-padding=" ">let a = 1;"#));
//! assert!(out.contains(r#"<span class="line" data-line-number="10">let b = 2;"#));
//! ```
//!
//! # Output
//!
//! Both `pre` and `code` get `data-language`, the gutter width as
//! `data-line-number-padding`, and every meta key as a kebab-cased `data-*`
//! attribute. Each line span gets `data-line-number`,
//! `data-line-number-padding` and `data-diff-symbol` where they apply, and
//! ends with a newline.

mod error;
mod fold;
mod highlight;
mod integrity;
mod language;
mod lines;
mod meta;
mod options;
mod processor;
mod reconcile;
mod transform;

pub use error::{Error, HighlightError, Result};
pub use fold::{ELLIPSIS, FoldRecognizer, MarkerFold};
#[cfg(feature = "arborium")]
pub use highlight::ArboriumHighlighter;
pub use highlight::{
    BuiltinHighlighter, FnHighlighter, Highlight, HighlighterFactory, HighlighterKind, LINE_CLASS,
    PlainHighlighter, from_fn, lines_to_pre,
};
pub use integrity::{content_digest, verify as verify_content};
pub use language::{LanguageSpec, language_token, parse_language};
pub use lines::{DiffSymbol, LineRecord, SourceLines};
pub use meta::{Meta, data_attribute_name};
pub use options::{FoldOptions, Options, OptionsError};
pub use processor::{FileFailure, ProcessError, ProcessOptions, Processor, ProcessorStats};
pub use reconcile::{DIFF_SYMBOL_ATTR, LINE_NUMBER_ATTR, LINE_NUMBER_PADDING_ATTR, reconcile};
pub use transform::{AsyncCodeBlocks, SyncCodeBlocks};
