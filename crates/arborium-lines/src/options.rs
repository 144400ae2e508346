//! Transform options, loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::fold::ELLIPSIS;

/// Options for transforming code blocks.
///
/// ```toml
/// ignore-unknown-language = false
///
/// [fold]
/// marker = "..."
/// line-class = "collapsed"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Retry without a language when the highlighter doesn't know the
    /// block's language, instead of failing the document.
    pub ignore_unknown_language: bool,
    pub fold: FoldOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignore_unknown_language: true,
            fold: FoldOptions::default(),
        }
    }
}

/// How fold placeholder lines are recognized and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FoldOptions {
    /// Text a highlighted line must end with to be a fold placeholder.
    pub marker: String,
    /// Class added to the placeholder line.
    pub line_class: String,
    /// Class of the element holding the line's indentation.
    pub spacer_class: String,
    /// Class of the element holding the marker.
    pub marker_class: String,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            marker: ELLIPSIS.to_string(),
            line_class: "folded".to_string(),
            spacer_class: "fold-space".to_string(),
            marker_class: "fold-marker".to_string(),
        }
    }
}

/// Errors loading options.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum OptionsError {
    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(arborium_lines::config_read))]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    #[diagnostic(code(arborium_lines::config_parse))]
    Parse(#[from] toml::de::Error),
}

impl Options {
    /// Parse options from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(input)?)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let input = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }
}
