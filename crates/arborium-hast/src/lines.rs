//! Splitting highlighted fragments into lines.

use crate::Node;

/// Split a list of sibling nodes into one list per source line.
///
/// Text is split on `\n`. An element whose text spans several lines is
/// cloned once per line it touches, so every returned line is a
/// self-contained, well-nested fragment that keeps the token styling of the
/// original. Comments and childless elements stay on the line they start on.
///
/// The result always has `newline count + 1` entries, matching
/// `str::split('\n')` on the concatenated text.
pub fn split_lines(nodes: &[Node]) -> Vec<Vec<Node>> {
    let mut lines = vec![Vec::new()];
    for node in nodes {
        split_node(node, &mut lines);
    }
    lines
}

fn split_node(node: &Node, lines: &mut Vec<Vec<Node>>) {
    match node {
        Node::Text(text) => {
            let mut parts = text.split('\n');
            if let Some(first) = parts.next() {
                push_text(lines, first);
            }
            for part in parts {
                lines.push(Vec::new());
                push_text(lines, part);
            }
        }
        Node::Element(el) if !el.children.is_empty() => {
            let inner = split_lines(&el.children);
            let last = inner.len() - 1;
            for (i, children) in inner.into_iter().enumerate() {
                if i > 0 {
                    lines.push(Vec::new());
                }
                // An element ending in a newline shouldn't leave an empty
                // clone of itself on the following line.
                if children.is_empty() && (i > 0 || last > 0) {
                    continue;
                }
                push(lines, Node::Element(el.clone_with_children(children)));
            }
        }
        Node::Root(children) => {
            for child in children {
                split_node(child, lines);
            }
        }
        other => push(lines, other.clone()),
    }
}

fn push_text(lines: &mut [Vec<Node>], text: &str) {
    if !text.is_empty() {
        push(lines, Node::text(text));
    }
}

fn push(lines: &mut [Vec<Node>], node: Node) {
    if let Some(line) = lines.last_mut() {
        line.push(node);
    }
}
