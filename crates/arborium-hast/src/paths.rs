//! Locating code blocks by child-index path.
//!
//! Paths are collected up front and resolved later, so callers can walk the
//! tree once, do async work per block, and then replace blocks in place.

use crate::Node;

/// Child-index paths of every `pre` element that has a `code` element child,
/// in document order.
///
/// Matches are not descended into: a `pre > code` nested inside another match
/// belongs to the outer block.
pub fn code_block_paths(root: &Node) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    let mut current = Vec::new();
    collect(root, &mut current, &mut paths);
    paths
}

fn collect(node: &Node, current: &mut Vec<usize>, paths: &mut Vec<Vec<usize>>) {
    if let Some(el) = node.as_element()
        && el.tag == "pre"
        && el.child_elements().any(|child| child.tag == "code")
    {
        paths.push(current.clone());
        return;
    }

    for (i, child) in node.children().iter().enumerate() {
        current.push(i);
        collect(child, current, paths);
        current.pop();
    }
}

/// Resolve a child-index path.
pub fn node_at<'a>(root: &'a Node, path: &[usize]) -> Option<&'a Node> {
    path.iter()
        .try_fold(root, |node, &index| node.children().get(index))
}

/// Resolve a child-index path mutably.
pub fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    let mut node = root;
    for &index in path {
        node = node.children_mut()?.get_mut(index)?;
    }
    Some(node)
}
