//! Merging highlighted lines with their source line records.
//!
//! The highlighter re-tokenizes the text on its own, so its lines and the
//! [`LineRecord`]s are two independently produced sequences. They are paired
//! by index and nothing else: the counts are checked once, up front, and a
//! mismatch is fatal.

use arborium_hast::{Element, Node, nodes_text_content};

use crate::error::{Error, Result};
use crate::fold::FoldRecognizer;
use crate::lines::LineRecord;
use crate::options::FoldOptions;

pub const LINE_NUMBER_ATTR: &str = "data-line-number";
pub const LINE_NUMBER_PADDING_ATTR: &str = "data-line-number-padding";
pub const DIFF_SYMBOL_ATTR: &str = "data-diff-symbol";

/// Annotate each highlighted line with its record.
///
/// Fold placeholders (as decided by `folds`) are rebuilt as an indentation
/// spacer plus a marker and get no line attributes. Every other line gets
/// line number, padding and diff symbol attributes, replacing whatever the
/// highlighter set under those names. Every line ends with a `\n` text node.
pub fn reconcile(
    lines: Vec<Element>,
    records: &[LineRecord],
    folds: &dyn FoldRecognizer,
    fold: &FoldOptions,
) -> Result<Vec<Element>> {
    if lines.len() != records.len() {
        return Err(Error::LineCountMismatch {
            source_lines: records.len(),
            rendered_lines: lines.len(),
        });
    }

    Ok(lines
        .into_iter()
        .zip(records)
        .map(|(line, record)| {
            let mut line = if folds.is_fold(&line) {
                fold_line(line, folds.marker(), fold)
            } else {
                annotate_line(line, record)
            };
            line.children.push(Node::text("\n"));
            line
        })
        .collect())
}

fn fold_line(mut line: Element, marker: &str, fold: &FoldOptions) -> Element {
    let indent: String = nodes_text_content(&line.children)
        .chars()
        .filter(|c| c.is_whitespace())
        .collect();

    line.children = vec![
        Element::new("span")
            .with_class(&fold.spacer_class)
            .with_child(Node::text(indent))
            .into(),
        Element::new("span")
            .with_class(&fold.marker_class)
            .with_child(Node::text(marker))
            .into(),
    ];
    line.add_class(&fold.line_class);
    line
}

fn annotate_line(mut line: Element, record: &LineRecord) -> Element {
    line.set_or_remove_attr(LINE_NUMBER_ATTR, record.line_number.as_deref());
    line.set_or_remove_attr(
        LINE_NUMBER_PADDING_ATTR,
        record.line_number_padding.as_deref(),
    );
    line.set_or_remove_attr(
        DIFF_SYMBOL_ATTR,
        record.diff_symbol.map(|symbol| symbol.as_str()),
    );
    line
}
