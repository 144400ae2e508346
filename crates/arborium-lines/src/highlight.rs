//! The highlighter boundary.
//!
//! Tokenizing and coloring is not done here: a [`Highlight`] implementation
//! is injected and called with the (diff-stripped) source text. It must
//! return a `pre` element whose first child is a `code` element holding one
//! `span` per source line.
//!
//! Like arborium's grammar providers, the call is async so that highlighters
//! which need to load something (a grammar from a CDN, a remote service) fit
//! the same interface. Highlighters that never wait return a ready future and
//! work with [`SyncCodeBlocks`](crate::SyncCodeBlocks).

use std::future::Future;

use arborium_hast::{Element, Node};

use crate::error::HighlightError;

/// Class of the per-line spans produced by the built-in highlighters.
pub const LINE_CLASS: &str = "line";

/// Renders source text into a `pre > code > span.line*` tree.
pub trait Highlight {
    /// Highlight `code`. `language` is `None` for plain rendering.
    ///
    /// Return [`HighlightError::UnsupportedLanguage`] for unknown languages
    /// so the caller can fall back to plain rendering.
    fn highlight(
        &mut self,
        code: &str,
        language: Option<&str>,
    ) -> impl Future<Output = Result<Element, HighlightError>>;
}

/// A [`Highlight`] backed by a synchronous closure.
pub struct FnHighlighter<F>(F);

/// Adapt a closure into a [`Highlight`].
///
/// ```rust
/// use arborium_lines::{SyncCodeBlocks, from_fn, lines_to_pre};
/// use arborium_hast::Node;
///
/// let highlighter = from_fn(|code: &str, _lang: Option<&str>| {
///     Ok(lines_to_pre(code.split('\n').map(|l| vec![Node::text(l)])))
/// });
/// let mut blocks = SyncCodeBlocks::new(highlighter);
/// let (html, count) = blocks
///     .transform_html("<pre><code>a\nb</code></pre>")
///     .unwrap();
/// assert_eq!(count, 1);
/// assert!(html.contains(r#"<span class="line">a"#));
/// ```
pub fn from_fn<F>(f: F) -> FnHighlighter<F>
where
    F: FnMut(&str, Option<&str>) -> Result<Element, HighlightError>,
{
    FnHighlighter(f)
}

impl<F> Highlight for FnHighlighter<F>
where
    F: FnMut(&str, Option<&str>) -> Result<Element, HighlightError>,
{
    async fn highlight(
        &mut self,
        code: &str,
        language: Option<&str>,
    ) -> Result<Element, HighlightError> {
        (self.0)(code, language)
    }
}

/// Build `pre.arborium > code > span.line*` from per-line content.
///
/// Lines are separated by `\n` text nodes, the way highlighters usually
/// render them; the reconciler only keeps the spans.
pub fn lines_to_pre<I>(lines: I) -> Element
where
    I: IntoIterator<Item = Vec<Node>>,
{
    let mut code = Element::new("code");
    for (i, children) in lines.into_iter().enumerate() {
        if i > 0 {
            code.children.push(Node::text("\n"));
        }
        code.children.push(
            Element::new("span")
                .with_class(LINE_CLASS)
                .with_children(children)
                .into(),
        );
    }
    Element::new("pre").with_class("arborium").with_child(code)
}

/// Renders every line as plain text, whatever the language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl PlainHighlighter {
    pub fn render(&self, code: &str) -> Element {
        lines_to_pre(code.split('\n').map(|line| {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![Node::text(line)]
            }
        }))
    }
}

impl Highlight for PlainHighlighter {
    async fn highlight(
        &mut self,
        code: &str,
        _language: Option<&str>,
    ) -> Result<Element, HighlightError> {
        Ok(self.render(code))
    }
}

#[cfg(feature = "arborium")]
pub use self::arborium_backend::ArboriumHighlighter;

#[cfg(feature = "arborium")]
mod arborium_backend {
    use std::sync::Arc;

    use arborium::{GrammarStore, Highlighter};
    use arborium_hast::{Element, Node, parse_fragment, split_lines};

    use super::{Highlight, PlainHighlighter, lines_to_pre};
    use crate::error::HighlightError;

    /// Tree-sitter highlighting through [`arborium::Highlighter`].
    ///
    /// The HTML arborium renders (`<a-k>fn</a-k> ...`) is parsed back into
    /// nodes and split per line, so tokens spanning lines are cloned onto
    /// each line they cover.
    pub struct ArboriumHighlighter {
        inner: Highlighter,
    }

    impl ArboriumHighlighter {
        pub fn new() -> Self {
            Self {
                inner: Highlighter::new(),
            }
        }

        /// Share compiled grammars with other highlighters (one per thread).
        pub fn with_store(store: Arc<GrammarStore>) -> Self {
            Self {
                inner: Highlighter::with_store(store),
            }
        }

        pub fn render(
            &mut self,
            code: &str,
            language: Option<&str>,
        ) -> Result<Element, HighlightError> {
            let Some(language) = language else {
                return Ok(PlainHighlighter.render(code));
            };

            let html = self.inner.highlight(language, code).map_err(|e| match e {
                arborium::Error::UnsupportedLanguage { language } => {
                    HighlightError::UnsupportedLanguage(language)
                }
                other => HighlightError::Failed(other.to_string()),
            })?;

            let nodes =
                parse_fragment(&html).map_err(|e| HighlightError::Failed(e.to_string()))?;
            let mut lines = split_lines(&nodes);

            // The renderer may drop trailing whitespace-only lines.
            let expected = code.split('\n').count();
            while lines.len() < expected {
                lines.push(Vec::<Node>::new());
            }

            Ok(lines_to_pre(lines))
        }
    }

    impl Default for ArboriumHighlighter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Highlight for ArboriumHighlighter {
        async fn highlight(
            &mut self,
            code: &str,
            language: Option<&str>,
        ) -> Result<Element, HighlightError> {
            self.render(code, language)
        }
    }
}

/// Highlighters available to the CLI and the directory processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HighlighterKind {
    /// No tokenization, one span per line.
    #[default]
    Plain,
    /// Tree-sitter grammars via arborium (needs the `arborium` feature).
    Arborium,
}

impl HighlighterKind {
    /// Whether this highlighter was compiled in.
    pub fn is_available(self) -> bool {
        match self {
            Self::Plain => true,
            Self::Arborium => cfg!(feature = "arborium"),
        }
    }
}

/// One of the built-in highlighters, chosen at runtime.
pub enum BuiltinHighlighter {
    Plain(PlainHighlighter),
    #[cfg(feature = "arborium")]
    Arborium(ArboriumHighlighter),
}

impl BuiltinHighlighter {
    pub fn new(kind: HighlighterKind) -> Result<Self, HighlightError> {
        Ok(HighlighterFactory::new(kind)?.make())
    }
}

/// Makes highlighters of one kind that share compiled grammars, so each
/// worker thread can own one without recompiling anything.
#[derive(Clone)]
pub struct HighlighterFactory {
    kind: HighlighterKind,
    #[cfg(feature = "arborium")]
    store: std::sync::Arc<arborium::GrammarStore>,
}

impl HighlighterFactory {
    /// Fails if `kind` wasn't compiled in.
    pub fn new(kind: HighlighterKind) -> Result<Self, HighlightError> {
        if !kind.is_available() {
            return Err(HighlightError::Unavailable(format!("{kind:?}").to_lowercase()));
        }
        Ok(Self {
            kind,
            #[cfg(feature = "arborium")]
            store: std::sync::Arc::new(arborium::GrammarStore::new()),
        })
    }

    pub fn kind(&self) -> HighlighterKind {
        self.kind
    }

    pub fn make(&self) -> BuiltinHighlighter {
        match self.kind {
            #[cfg(feature = "arborium")]
            HighlighterKind::Arborium => {
                BuiltinHighlighter::Arborium(ArboriumHighlighter::with_store(self.store.clone()))
            }
            _ => BuiltinHighlighter::Plain(PlainHighlighter),
        }
    }
}

impl Highlight for BuiltinHighlighter {
    async fn highlight(
        &mut self,
        code: &str,
        language: Option<&str>,
    ) -> Result<Element, HighlightError> {
        match self {
            Self::Plain(plain) => plain.highlight(code, language).await,
            #[cfg(feature = "arborium")]
            Self::Arborium(arborium) => arborium.highlight(code, language).await,
        }
    }
}
