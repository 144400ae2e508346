//! Building a [`Node`] tree from HTML.
//!
//! lol_html is a streaming rewriter, not a tree builder, so the tree is
//! assembled from its callbacks: every start tag opens an element, the end-tag
//! handler registered on it closes it again, and document-level text, comment
//! and doctype handlers fill in the rest.
//!
//! lol_html reports no end tag for elements whose end tag is implied, so the
//! builder applies the HTML implied-end-tag rules itself when an element
//! opens: a block element closes an open `<p>`, a `<li>` closes the previous
//! `<li>`, and likewise for `dd`/`dt`, `option`/`optgroup` and table rows and
//! cells. Other fixups (implied `<html>`/`<body>`, foster parenting) are not
//! performed.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::EndTag;
use lol_html::{HtmlRewriter, Settings, doc_comments, doc_text, doctype, element};

use crate::{Element, Node, RAW_TEXT_ELEMENTS};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Errors that can occur while parsing HTML.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ParseError {
    /// lol_html rejected the input.
    #[error("failed to tokenize HTML: {0}")]
    #[diagnostic(code(arborium_hast::rewrite))]
    Rewrite(String),
}

/// Parse an HTML document into a [`Node::Root`].
///
/// Character references in text and attribute values are decoded, except
/// inside `<script>` and `<style>`. A `data-meta` attribute on a `code`
/// element is moved into [`Element::meta`].
pub fn parse_html(html: &str) -> Result<Node, ParseError> {
    let builder = Rc::new(RefCell::new(TreeBuilder::default()));

    {
        let on_element = Rc::clone(&builder);
        let on_text = Rc::clone(&builder);
        let on_comment = Rc::clone(&builder);
        let on_doctype = Rc::clone(&builder);

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element!("*", move |el| {
                    let mut element = Element::new(el.tag_name());
                    for attr in el.attributes() {
                        let name = attr.name();
                        let value = decode_attribute(&attr.value()).into_owned();
                        if element.tag == "code" && name == "data-meta" {
                            element.meta = Some(value);
                        } else {
                            element.attrs.insert(name, value);
                        }
                    }

                    match el.end_tag_handlers() {
                        Some(handlers) => {
                            let id = on_element.borrow_mut().open(element);
                            let on_end = Rc::clone(&on_element);
                            let handler: Box<dyn FnOnce(&mut EndTag<'_>) -> HandlerResult> =
                                Box::new(move |_end| {
                                    on_end.borrow_mut().close(id);
                                    Ok(())
                                });
                            handlers.push(handler);
                        }
                        // Void or self-closing: there will be no end tag.
                        None => on_element.borrow_mut().append_void(element),
                    }
                    Ok(())
                })],
                document_content_handlers: vec![
                    doctype!(move |doctype| {
                        let name = doctype.name().unwrap_or_default();
                        on_doctype.borrow_mut().append(Node::Doctype(name));
                        Ok(())
                    }),
                    doc_comments!(move |comment| {
                        on_comment
                            .borrow_mut()
                            .append(Node::Comment(comment.text()));
                        Ok(())
                    }),
                    doc_text!(move |chunk| {
                        on_text.borrow_mut().push_raw_text(chunk.as_str());
                        Ok(())
                    }),
                ],
                strict: false,
                ..Settings::new()
            },
            |_: &[u8]| {},
        );

        rewriter
            .write(html.as_bytes())
            .map_err(|e| ParseError::Rewrite(e.to_string()))?;
        rewriter
            .end()
            .map_err(|e| ParseError::Rewrite(e.to_string()))?;
    }

    let builder = std::mem::take(&mut *builder.borrow_mut());
    Ok(Node::Root(builder.finish()))
}

/// Parse an HTML fragment into a list of sibling nodes.
pub fn parse_fragment(html: &str) -> Result<Vec<Node>, ParseError> {
    match parse_html(html)? {
        Node::Root(children) => Ok(children),
        other => Ok(vec![other]),
    }
}

/// Elements whose start tag closes an open `<p>` in button scope.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dd", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "li", "listing", "main", "menu", "nav", "ol",
    "p", "pre", "search", "section", "summary", "table", "ul", "xmp",
];

/// Elements that bound the default scope.
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
];

/// The "special" category, which stops the search for an open list item.
const SPECIAL: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound",
    "blockquote", "body", "br", "button", "caption", "center", "col", "colgroup", "dd",
    "details", "dir", "div", "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer",
    "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup",
    "hr", "html", "iframe", "img", "input", "keygen", "li", "link", "listing", "main",
    "marquee", "menu", "meta", "nav", "noembed", "noframes", "noscript", "object", "ol", "p",
    "param", "plaintext", "pre", "script", "search", "section", "select", "source", "style",
    "summary", "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "title",
    "tr", "track", "ul", "wbr", "xmp",
];

/// Accumulates lol_html callbacks into a tree.
#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    /// Open elements, innermost last, tagged with the id their end-tag
    /// handler will report.
    open: Vec<(usize, Element)>,
    next_id: usize,
    /// Raw text not yet decoded; flushed before any structural change.
    pending_text: String,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) -> usize {
        self.flush_text();
        self.close_implied(&element.tag);
        let id = self.next_id;
        self.next_id += 1;
        self.open.push((id, element));
        id
    }

    /// Append an element that has no end tag, such as `<br>` or `<hr>`.
    fn append_void(&mut self, element: Element) {
        self.flush_text();
        self.close_implied(&element.tag);
        self.append(Node::Element(element));
    }

    /// Close the element with the given id, implicitly closing anything still
    /// open inside it. Unknown ids (already closed) are ignored.
    fn close(&mut self, id: usize) {
        self.flush_text();
        if let Some(pos) = self.open.iter().rposition(|(open_id, _)| *open_id == id) {
            self.pop_to(pos);
        }
    }

    /// Close the elements whose end tag is implied by a `tag` start tag.
    fn close_implied(&mut self, tag: &str) {
        if CLOSES_PARAGRAPH.contains(&tag) {
            self.close_open(&["p"], |open| {
                open == "button" || SCOPE_BOUNDARIES.contains(&open)
            });
        }
        match tag {
            "li" => self.close_open(&["li"], |open| {
                open == "ul" || open == "ol" || is_list_item_stop(open)
            }),
            "dd" | "dt" => self.close_open(&["dd", "dt"], is_list_item_stop),
            "option" => self.close_current("option"),
            "optgroup" => {
                self.close_current("option");
                self.close_current("optgroup");
            }
            "tr" => self.close_open(&["tr"], is_table_boundary),
            "td" | "th" => self.close_open(&["td", "th"], |open| {
                open == "tr" || is_table_boundary(open)
            }),
            "tbody" | "thead" | "tfoot" => {
                self.close_open(&["tbody", "thead", "tfoot"], |open| open == "table")
            }
            _ => {}
        }
    }

    /// Close the innermost open element named in `targets`, unless an element
    /// for which `stop` holds is found first.
    fn close_open(&mut self, targets: &[&str], stop: impl Fn(&str) -> bool) {
        let mut found = None;
        for (pos, (_, element)) in self.open.iter().enumerate().rev() {
            let tag = element.tag.as_str();
            if targets.contains(&tag) {
                found = Some(pos);
                break;
            }
            if stop(tag) {
                break;
            }
        }
        if let Some(pos) = found {
            self.pop_to(pos);
        }
    }

    fn close_current(&mut self, tag: &str) {
        if self.open.last().is_some_and(|(_, element)| element.tag == tag) {
            self.pop_to(self.open.len() - 1);
        }
    }

    /// Pop every open element from `pos` up, appending each to its parent.
    fn pop_to(&mut self, pos: usize) {
        while self.open.len() > pos {
            if let Some((_, element)) = self.open.pop() {
                self.append(Node::Element(element));
            }
        }
    }

    fn push_raw_text(&mut self, raw: &str) {
        self.pending_text.push_str(raw);
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.pending_text);
        let in_raw_text = self
            .open
            .last()
            .is_some_and(|(_, el)| RAW_TEXT_ELEMENTS.contains(&el.tag.as_str()));
        let text = if in_raw_text {
            raw
        } else {
            decode_entities(&raw).into_owned()
        };
        self.append(Node::Text(text));
    }

    fn append(&mut self, node: Node) {
        if !matches!(node, Node::Text(_)) {
            self.flush_text();
        }
        let children = match self.open.last_mut() {
            Some((_, element)) => &mut element.children,
            None => &mut self.root,
        };
        if let (Node::Text(new), Some(Node::Text(previous))) = (&node, children.last_mut()) {
            previous.push_str(new);
            return;
        }
        children.push(node);
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush_text();
        while let Some((_, element)) = self.open.pop() {
            self.append(Node::Element(element));
        }
        self.root
    }
}

fn is_list_item_stop(tag: &str) -> bool {
    SPECIAL.contains(&tag) && !matches!(tag, "address" | "div" | "p")
}

fn is_table_boundary(tag: &str) -> bool {
    matches!(tag, "table" | "html" | "template")
}

/// Decode HTML character references in text.
///
/// Numeric references and the full WHATWG named-reference table are
/// supported, including the legacy names allowed without a trailing `;`.
/// Unknown references are left untouched.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    htmlize::unescape(input)
}

/// Decode HTML character references in an attribute value.
///
/// Like [`decode_entities`], except that a legacy reference without `;`
/// followed by an alphanumeric or `=` is kept literally (`?a=1&copy=2`).
pub fn decode_attribute(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    htmlize::unescape_attribute(input)
}
