//! Owned HTML syntax tree for arborium post-processors.
//!
//! This crate provides a small, owned document tree in the spirit of
//! [hast](https://github.com/syntax-tree/hast), plus the pieces needed to
//! round-trip real documents through it:
//!
//! - [`parse_html`] / [`parse_fragment`]: build a tree from HTML using
//!   lol_html's streaming tokenizer
//! - [`to_html`]: serialize a tree back to HTML
//! - [`split_lines`]: split a highlighted token fragment into per-line nodes
//! - [`code_block_paths`]: locate `pre > code` pairs in document order
//!
//! # Example
//!
//! ```rust
//! use arborium_hast::{Element, Node, parse_html, to_html};
//!
//! let mut root = parse_html("<p>Hello</p>").unwrap();
//! if let Node::Root(children) = &mut root {
//!     children.push(Node::Element(
//!         Element::new("p").with_class("note").with_child(Node::text("World")),
//!     ));
//! }
//! assert_eq!(to_html(&root), r#"<p>Hello</p><p class="note">World</p>"#);
//! ```

mod html;
mod lines;
mod parse;
mod paths;

pub use html::{escape_attribute, escape_text, to_html, write_html};
pub use lines::split_lines;
pub use parse::{ParseError, decode_attribute, decode_entities, parse_fragment, parse_html};
pub use paths::{code_block_paths, node_at, node_at_mut};

use indexmap::IndexMap;

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text content is neither entity-decoded nor escaped.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Top-level container for a parsed document or fragment.
    Root(Vec<Node>),
    /// An element with attributes and children.
    Element(Element),
    /// Decoded text content.
    Text(String),
    /// A comment, without the `<!--` / `-->` delimiters.
    Comment(String),
    /// A doctype declaration, holding the doctype name (usually `html`).
    Doctype(String),
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the element mutably if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the text value if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns true if this node is an element with the given tag name.
    pub fn is_element(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|el| el.tag == tag)
    }

    /// Children of a root or element node; empty for leaf nodes.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root(children) => children,
            Node::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Mutable children of a root or element node, `None` for leaf nodes.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root(children) => Some(children),
            Node::Element(el) => Some(&mut el.children),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An HTML element.
///
/// Attribute names are stored lower-case, in source order. A missing key means
/// the attribute is absent; there is no separate "null" value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Lower-case tag name.
    pub tag: String,
    /// Attributes in source order.
    pub attrs: IndexMap<String, String>,
    /// Child nodes.
    pub children: Vec<Node>,
    /// Node-level annotation (the info string after a fenced code block's
    /// language). Serialized as a `data-meta` attribute.
    pub meta: Option<String>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder: set an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: add a class.
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: replace the children.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Builder: set the node-level annotation.
    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Remove an attribute, keeping the order of the remaining ones.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    /// Set the attribute when `value` is `Some`, remove it when `None`.
    pub fn set_or_remove_attr(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => self.set_attr(name, value),
            None => {
                self.remove_attr(name);
            }
        }
    }

    /// Iterate over the whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Append a class unless it is already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        if let Some(existing) = self
            .attrs
            .get_mut("class")
            .filter(|existing| !existing.trim().is_empty())
        {
            existing.push(' ');
            existing.push_str(class);
            return;
        }
        self.set_attr("class", class);
    }

    /// Iterate over child elements, skipping text, comments and doctypes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Clone the element's tag, attributes and meta with new children.
    pub fn clone_with_children(&self, children: Vec<Node>) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children,
            meta: self.meta.clone(),
        }
    }
}

/// Concatenated text of a node and its descendants (comments excluded).
///
/// This is the equivalent of `hast-util-to-string`.
pub fn text_content(node: &Node) -> String {
    let mut out = String::new();
    push_text(node, &mut out);
    out
}

/// Concatenated text of a list of sibling nodes.
pub fn nodes_text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        push_text(node, &mut out);
    }
    out
}

fn push_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Root(children) => children.iter().for_each(|child| push_text(child, out)),
        Node::Element(el) => el.children.iter().for_each(|child| push_text(child, out)),
        Node::Comment(_) | Node::Doctype(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_class_appends_once() {
        let mut el = Element::new("span").with_class("line");
        el.add_class("folded");
        el.add_class("line");
        assert_eq!(el.attr("class"), Some("line folded"));
        assert!(el.has_class("folded"));
    }

    #[test]
    fn test_add_class_replaces_blank_attribute() {
        let mut el = Element::new("span").with_attr("class", "  ");
        el.add_class("line");
        assert_eq!(el.attr("class"), Some("line"));
    }

    #[test]
    fn test_set_or_remove_attr_keeps_order() {
        let mut el = Element::new("span")
            .with_attr("a", "1")
            .with_attr("b", "2")
            .with_attr("c", "3");
        el.set_or_remove_attr("b", None);
        el.set_or_remove_attr("a", Some("x"));
        let names: Vec<_> = el.attrs.keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(el.attr("a"), Some("x"));
    }

    #[test]
    fn test_text_content_skips_comments() {
        let node = Node::Element(
            Element::new("code")
                .with_child(Element::new("span").with_child(Node::text("let")))
                .with_child(Node::Comment("ignored".into()))
                .with_child(Node::text(" x")),
        );
        assert_eq!(text_content(&node), "let x");
    }

    #[test]
    fn test_child_elements_filters_text() {
        let el = Element::new("code")
            .with_child(Element::new("span"))
            .with_child(Node::text("\n"))
            .with_child(Element::new("span"));
        assert_eq!(el.child_elements().count(), 2);
    }
}
