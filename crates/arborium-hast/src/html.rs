//! HTML serialization.

use std::fmt::Write;

use crate::{Element, Node, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};

/// Serialize a node (and its descendants) to an HTML string.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_html(&mut out, node);
    out
}

/// Serialize a node into an existing buffer.
pub fn write_html(out: &mut String, node: &Node) {
    write_node(out, node, false);
}

fn write_node(out: &mut String, node: &Node, raw_text: bool) {
    match node {
        Node::Root(children) => {
            for child in children {
                write_node(out, child, false);
            }
        }
        Node::Element(el) => write_element(out, el),
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Doctype(name) => {
            let _ = write!(out, "<!DOCTYPE {name}>");
        }
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
    }
    if let Some(meta) = &el.meta {
        let _ = write!(out, " data-meta=\"{}\"", escape_attribute(meta));
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
    for child in &el.children {
        write_node(out, child, raw_text);
    }

    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
