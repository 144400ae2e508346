//! Recognizing fold placeholder lines.
//!
//! A highlighter renders elided code as a line whose last text ends in a
//! marker glyph. Which glyph depends on the highlighter, so recognition is a
//! trait rather than a hard-coded comparison.

use arborium_hast::{Element, Node};

/// The default fold marker, U+2026 HORIZONTAL ELLIPSIS.
pub const ELLIPSIS: &str = "…";

/// Decides whether a highlighted line is a fold placeholder.
pub trait FoldRecognizer: Send + Sync {
    /// Whether `line` is a fold placeholder.
    fn is_fold(&self, line: &Element) -> bool;

    /// The marker text rendered in place of the folded code.
    fn marker(&self) -> &str;
}

/// Recognizes lines whose last nested text ends with a marker string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFold {
    marker: String,
}

impl MarkerFold {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for MarkerFold {
    fn default() -> Self {
        Self::new(ELLIPSIS)
    }
}

impl FoldRecognizer for MarkerFold {
    fn is_fold(&self, line: &Element) -> bool {
        !self.marker.is_empty()
            && last_text(&line.children).is_some_and(|text| text.ends_with(self.marker.as_str()))
    }

    fn marker(&self) -> &str {
        &self.marker
    }
}

/// The deepest last text node, following last children down.
fn last_text(children: &[Node]) -> Option<&str> {
    match children.last()? {
        Node::Text(text) => Some(text),
        Node::Element(el) => last_text(&el.children),
        _ => None,
    }
}
