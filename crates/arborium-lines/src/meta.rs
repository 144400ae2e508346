//! Decoding the meta annotation attached to a code block.
//!
//! The annotation is a JSON5 object literal, e.g.
//! `{ file: 'main.rs', lineNumbers: true, lineNumbersOffset: 10 }`.
//! Recognized keys are type-checked into [`Meta`]'s fields; every key, known
//! or not, is also kept in order so it can be emitted as a `data-*` attribute.

use heck::ToKebabCase;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};

/// Decoded code block options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    /// Expected SHA-1 of the block's content.
    pub content_hash: Option<String>,
    /// Display label, usually a file name.
    pub file: Option<String>,
    /// Whether lines get numbered.
    pub line_numbers: bool,
    /// First line number (defaults to 1).
    pub line_numbers_offset: Option<i64>,
    pub content_before: bool,
    pub content_after: bool,
    /// Every decoded key, in source order.
    pub entries: IndexMap<String, Value>,
}

impl Meta {
    /// Decode an annotation. Absent or blank input gives the empty record.
    pub fn decode(annotation: Option<&str>) -> Result<Self> {
        let Some(annotation) = annotation.filter(|a| !a.trim().is_empty()) else {
            return Ok(Self::default());
        };

        let value: Value =
            json5::from_str(annotation).map_err(|e| Error::MetaParse(e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(Error::MetaParse(format!(
                "expected an object, got `{annotation}`"
            )));
        };

        let mut meta = Self::default();
        for (key, value) in object {
            match key.as_str() {
                "contentHash" => meta.content_hash = string_field(&key, &value)?,
                "file" => meta.file = string_field(&key, &value)?,
                "lineNumbers" => meta.line_numbers = bool_field(&key, &value)?,
                "lineNumbersOffset" => meta.line_numbers_offset = integer_field(&key, &value)?,
                "contentBefore" => meta.content_before = bool_field(&key, &value)?,
                "contentAfter" => meta.content_after = bool_field(&key, &value)?,
                _ => {}
            }
            meta.entries.insert(key, value);
        }

        Ok(meta)
    }

    /// The `data-*` attributes contributed by this record, in key order.
    ///
    /// `None` values mean "absent": the attribute must be removed rather than
    /// set.
    pub fn data_attributes(&self) -> Vec<(String, Option<String>)> {
        self.entries
            .iter()
            .map(|(key, value)| (data_attribute_name(key), attribute_value(value)))
            .collect()
    }
}

/// `lineNumbersOffset` → `data-line-numbers-offset`.
pub fn data_attribute_name(key: &str) -> String {
    format!("data-{}", key.to_kebab_case())
}

fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => Some(number_to_string(n)),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(attribute_value)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Render numbers the way `String(n)` does in JavaScript: integral floats
/// lose their `.0`.
fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

fn string_field(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(type_error(key, "a string", other)),
    }
}

fn bool_field(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        other => Err(type_error(key, "a boolean", other)),
    }
}

fn integer_field(key: &str, value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(type_error(key, "an integer", value)),
            }
        }
        other => Err(type_error(key, "an integer", other)),
    }
}

fn type_error(key: &str, expected: &str, got: &Value) -> Error {
    Error::MetaParse(format!("`{key}` must be {expected}, got `{got}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_blank() {
        assert_eq!(Meta::decode(None).unwrap(), Meta::default());
        assert_eq!(Meta::decode(Some("  \n")).unwrap(), Meta::default());
    }

    #[test]
    fn test_known_keys() {
        let meta = Meta::decode(Some(
            "{ file: 'src/main.rs', lineNumbers: true, lineNumbersOffset: 5, contentHash: \"abc\", contentBefore: true }",
        ))
        .unwrap();
        assert_eq!(meta.file.as_deref(), Some("src/main.rs"));
        assert!(meta.line_numbers);
        assert_eq!(meta.line_numbers_offset, Some(5));
        assert_eq!(meta.content_hash.as_deref(), Some("abc"));
        assert!(meta.content_before);
        assert!(!meta.content_after);
    }

    #[test]
    fn test_json5_syntax() {
        let meta = Meta::decode(Some("{lineNumbers: true, /* c */ lineNumbersOffset: 1.0,}")).unwrap();
        assert_eq!(meta.line_numbers_offset, Some(1));
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let meta = Meta::decode(Some("{ title: 'Example', highlightLines: [1, 3] }")).unwrap();
        assert_eq!(
            meta.data_attributes(),
            vec![
                ("data-title".to_string(), Some("Example".to_string())),
                ("data-highlight-lines".to_string(), Some("1 3".to_string())),
            ]
        );
    }

    #[test]
    fn test_attribute_values() {
        let meta = Meta::decode(Some(
            "{ lineNumbers: true, contentAfter: false, file: null, ratio: 2.5, width: 3.0, nested: { a: 1 } }",
        ))
        .unwrap();
        let attrs: IndexMap<_, _> = meta.data_attributes().into_iter().collect();
        assert_eq!(attrs["data-line-numbers"].as_deref(), Some("true"));
        assert_eq!(attrs["data-content-after"], None);
        assert_eq!(attrs["data-file"], None);
        assert_eq!(attrs["data-ratio"].as_deref(), Some("2.5"));
        assert_eq!(attrs["data-width"].as_deref(), Some("3"));
        assert_eq!(attrs["data-nested"].as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_attribute_name_kebab_case() {
        assert_eq!(data_attribute_name("contentHash"), "data-content-hash");
        assert_eq!(data_attribute_name("lineNumbersOffset"), "data-line-numbers-offset");
        assert_eq!(data_attribute_name("file"), "data-file");
    }

    #[test]
    fn test_syntax_error() {
        let err = Meta::decode(Some("{ lineNumbers: ")).unwrap_err();
        assert!(matches!(err, Error::MetaParse(_)));
    }

    #[test]
    fn test_non_object() {
        let err = Meta::decode(Some("[1, 2]")).unwrap_err();
        assert!(matches!(err, Error::MetaParse(msg) if msg.contains("expected an object")));
    }

    #[test]
    fn test_wrong_type_names_key() {
        let err = Meta::decode(Some("{ lineNumbers: 'yes' }")).unwrap_err();
        assert!(matches!(err, Error::MetaParse(msg) if msg.contains("lineNumbers")));

        let err = Meta::decode(Some("{ lineNumbersOffset: 1.5 }")).unwrap_err();
        assert!(matches!(err, Error::MetaParse(msg) if msg.contains("lineNumbersOffset")));
    }
}
