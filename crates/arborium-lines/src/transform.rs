//! Transforming code blocks and whole documents.
//!
//! The logic is written once, as async code, in `CodeBlocksCore`. Two
//! wrappers expose it:
//!
//! - [`SyncCodeBlocks`] polls the future once. Highlighters that never wait
//!   complete on that first poll; one that does wait makes the transform fail
//!   with [`Error::HighlighterYielded`].
//! - [`AsyncCodeBlocks`] awaits it, for highlighters that load grammars or
//!   call out to a service.
//!
//! Blocks are always processed one at a time, in document order.

use std::future::Future;
use std::task::{Context, Poll, Waker};

use arborium_hast::{
    Element, Node, code_block_paths, node_at, node_at_mut, parse_html, to_html,
};
use tracing::{debug, trace, warn};

use crate::error::{Error, HighlightError, Result};
use crate::fold::{FoldRecognizer, MarkerFold};
use crate::highlight::Highlight;
use crate::integrity;
use crate::language::{language_token, parse_language};
use crate::lines::SourceLines;
use crate::meta::Meta;
use crate::options::Options;
use crate::reconcile::{LINE_NUMBER_PADDING_ATTR, reconcile};

const LANGUAGE_ATTR: &str = "data-language";

/// Shared implementation behind the sync and async wrappers.
struct CodeBlocksCore<H> {
    highlighter: H,
    options: Options,
    folds: Box<dyn FoldRecognizer>,
}

impl<H: Highlight> CodeBlocksCore<H> {
    fn new(highlighter: H, options: Options) -> Self {
        let folds = Box::new(MarkerFold::new(options.fold.marker.clone()));
        Self {
            highlighter,
            options,
            folds,
        }
    }

    /// Build the replacement for one `pre` element.
    async fn transform_block(&mut self, pre: &Element) -> Result<Element> {
        let (code, text) = block_parts(pre)?;

        let language = parse_language(language_token(code).as_deref());
        let meta = Meta::decode(code.meta.as_deref())?;
        let numbering_start = meta
            .line_numbers
            .then(|| meta.line_numbers_offset.unwrap_or(1));
        let lines = SourceLines::new(text, language.diff, numbering_start)?;

        let input = lines.highlight_input();
        integrity::verify(&input, meta.content_hash.as_deref())?;

        debug!(
            language = ?language.lang,
            diff = language.diff,
            lines = lines.len(),
            numbered = numbering_start.is_some(),
            file = ?meta.file,
            "transforming code block"
        );

        let rendered = self.invoke(&input, language.lang.as_deref()).await?;
        let (mut out_pre, mut out_code) = split_rendered(rendered)?;

        let spans: Vec<Element> = std::mem::take(&mut out_code.children)
            .into_iter()
            .filter_map(|child| match child {
                Node::Element(el) if el.tag == "span" => Some(el),
                _ => None,
            })
            .collect();

        let reconciled = reconcile(
            spans,
            &lines.records,
            self.folds.as_ref(),
            &self.options.fold,
        )?;

        let mut attributes = meta.data_attributes();
        attributes.push((LANGUAGE_ATTR.to_string(), language.lang.clone()));
        attributes.push((LINE_NUMBER_PADDING_ATTR.to_string(), lines.padding.clone()));

        for (name, value) in &attributes {
            out_pre.set_or_remove_attr(name, value.as_deref());
            out_code.set_or_remove_attr(name, value.as_deref());
        }

        out_code.children = reconciled.into_iter().map(Node::Element).collect();
        out_pre.children = vec![Node::Element(out_code)];
        Ok(out_pre)
    }

    /// Call the highlighter, retrying without a language if it doesn't know
    /// this one and the options allow it.
    async fn invoke(&mut self, code: &str, language: Option<&str>) -> Result<Element> {
        trace!(?language, bytes = code.len(), "invoking highlighter");
        let result = self.highlighter.highlight(code, language).await;
        match result {
            Err(HighlightError::UnsupportedLanguage(lang))
                if self.options.ignore_unknown_language && language.is_some() =>
            {
                warn!(language = %lang, "unsupported language, rendering as plain text");
                Ok(self.highlighter.highlight(code, None).await?)
            }
            result => Ok(result?),
        }
    }

    /// Transform every code block under `root`, returning how many there were.
    ///
    /// All replacements are built before any is applied, so on error `root`
    /// is left as it was.
    async fn transform_tree(&mut self, root: &mut Node) -> Result<usize> {
        let paths = code_block_paths(root);
        let mut replacements = Vec::with_capacity(paths.len());

        for path in paths {
            let Some(pre) = node_at(root, &path).and_then(Node::as_element) else {
                continue;
            };
            let block = self.transform_block(pre).await?;
            replacements.push((path, block));
        }

        let count = replacements.len();
        for (path, block) in replacements {
            if let Some(node) = node_at_mut(root, &path) {
                *node = Node::Element(block);
            }
        }
        Ok(count)
    }

    async fn transform_html(&mut self, html: &str) -> Result<(String, usize)> {
        let mut root = parse_html(html)?;
        let count = self.transform_tree(&mut root).await?;
        Ok((to_html(&root), count))
    }
}

/// The `code` element and its text, if `pre` has the required shape.
fn block_parts(pre: &Element) -> Result<(&Element, &str)> {
    if pre.tag != "pre" {
        return Err(Error::Shape(format!("expected a `pre` element, got `{}`", pre.tag)));
    }
    let [Node::Element(code)] = pre.children.as_slice() else {
        return Err(Error::Shape(format!(
            "expected `pre` to have a single `code` child, found {} children",
            pre.children.len()
        )));
    };
    if code.tag != "code" {
        return Err(Error::Shape(format!(
            "expected a `code` element inside `pre`, got `{}`",
            code.tag
        )));
    }
    let [Node::Text(text)] = code.children.as_slice() else {
        return Err(Error::Shape(
            "expected `code` to contain exactly one text node".to_string(),
        ));
    };
    Ok((code, text.as_str()))
}

/// Take apart the highlighter's `pre`, whose first child must be `code`.
fn split_rendered(mut rendered: Element) -> Result<(Element, Element)> {
    if rendered.children.is_empty() {
        return Err(Error::HighlightShape(
            "highlighter returned an empty element".to_string(),
        ));
    }
    match rendered.children.remove(0) {
        Node::Element(code) if code.tag == "code" => {
            rendered.children.clear();
            Ok((rendered, code))
        }
        other => Err(Error::HighlightShape(format!(
            "expected the first child of the rendered `{}` to be a `code` element, got {}",
            rendered.tag,
            describe(&other)
        ))),
    }
}

fn describe(node: &Node) -> String {
    match node {
        Node::Element(el) => format!("`{}`", el.tag),
        Node::Text(_) => "text".to_string(),
        Node::Comment(_) => "a comment".to_string(),
        Node::Doctype(_) => "a doctype".to_string(),
        Node::Root(_) => "a root".to_string(),
    }
}

/// Poll a future once; a pending future means the highlighter suspended.
fn poll_once<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    let mut future = std::pin::pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => Err(Error::HighlighterYielded),
    }
}

/// Synchronous code block transformer.
///
/// # Example
///
/// ```rust
/// use arborium_lines::{PlainHighlighter, SyncCodeBlocks};
///
/// let mut blocks = SyncCodeBlocks::new(PlainHighlighter);
/// let (html, count) = blocks
///     .transform_html(r#"<pre><code class="language-js-diff" data-meta="{ lineNumbers: true }">-a
/// +b</code></pre>"#)
///     .unwrap();
/// assert_eq!(count, 1);
/// assert!(html.contains(r#"data-language="js""#));
/// assert!(html.contains(r#"data-diff-symbol="+""#));
/// ```
pub struct SyncCodeBlocks<H> {
    core: CodeBlocksCore<H>,
}

impl<H: Highlight> SyncCodeBlocks<H> {
    /// Create a transformer with default options.
    pub fn new(highlighter: H) -> Self {
        Self::with_options(highlighter, Options::default())
    }

    pub fn with_options(highlighter: H, options: Options) -> Self {
        Self {
            core: CodeBlocksCore::new(highlighter, options),
        }
    }

    /// Replace the fold recognizer built from [`FoldOptions::marker`](crate::FoldOptions).
    pub fn with_fold_recognizer(mut self, folds: impl FoldRecognizer + 'static) -> Self {
        self.core.folds = Box::new(folds);
        self
    }

    pub fn options(&self) -> &Options {
        &self.core.options
    }

    pub fn highlighter_mut(&mut self) -> &mut H {
        &mut self.core.highlighter
    }

    /// Transform a single `pre` element into its replacement.
    pub fn transform_block(&mut self, pre: &Element) -> Result<Element> {
        poll_once(self.core.transform_block(pre))
    }

    /// Transform every code block in a tree. On error the tree is unchanged.
    pub fn transform_tree(&mut self, root: &mut Node) -> Result<usize> {
        poll_once(self.core.transform_tree(root))
    }

    /// Transform every code block in an HTML document.
    ///
    /// Returns the new document and the number of blocks transformed.
    pub fn transform_html(&mut self, html: &str) -> Result<(String, usize)> {
        poll_once(self.core.transform_html(html))
    }
}

/// Asynchronous code block transformer, for highlighters that await.
pub struct AsyncCodeBlocks<H> {
    core: CodeBlocksCore<H>,
}

impl<H: Highlight> AsyncCodeBlocks<H> {
    pub fn new(highlighter: H) -> Self {
        Self::with_options(highlighter, Options::default())
    }

    pub fn with_options(highlighter: H, options: Options) -> Self {
        Self {
            core: CodeBlocksCore::new(highlighter, options),
        }
    }

    pub fn with_fold_recognizer(mut self, folds: impl FoldRecognizer + 'static) -> Self {
        self.core.folds = Box::new(folds);
        self
    }

    pub fn options(&self) -> &Options {
        &self.core.options
    }

    pub fn highlighter_mut(&mut self) -> &mut H {
        &mut self.core.highlighter
    }

    pub async fn transform_block(&mut self, pre: &Element) -> Result<Element> {
        self.core.transform_block(pre).await
    }

    pub async fn transform_tree(&mut self, root: &mut Node) -> Result<usize> {
        self.core.transform_tree(root).await
    }

    pub async fn transform_html(&mut self, html: &str) -> Result<(String, usize)> {
        self.core.transform_html(html).await
    }
}
