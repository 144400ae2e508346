//! Splitting source text into numbered, diff-annotated lines.

use std::fmt;

use crate::error::{Error, Result};

/// Leading column of a line in a `-diff` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffSymbol {
    /// ` `: unchanged.
    Context,
    /// `-`: removed.
    Removed,
    /// `+`: added. Added lines are not numbered.
    Added,
}

impl DiffSymbol {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Context),
            '-' => Some(Self::Removed),
            '+' => Some(Self::Added),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Context => ' ',
            Self::Removed => '-',
            Self::Added => '+',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => " ",
            Self::Removed => "-",
            Self::Added => "+",
        }
    }
}

impl fmt::Display for DiffSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-line metadata, index-aligned with the highlighter's output lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRecord {
    /// Line text without its diff symbol.
    pub text: String,
    pub diff_symbol: Option<DiffSymbol>,
    pub line_number: Option<String>,
    /// Spaces right-aligning `line_number` to the widest number.
    pub line_number_padding: Option<String>,
}

/// The lines of one code block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLines {
    pub records: Vec<LineRecord>,
    /// Width of the line-number gutter as spaces; `None` when nothing is
    /// numbered.
    pub padding: Option<String>,
}

impl SourceLines {
    /// Split `raw` into lines.
    ///
    /// Line endings are normalized to `\n` and surrounding newlines trimmed.
    /// In diff mode every line must start with a [`DiffSymbol`], which is
    /// stripped from its text. With `numbering_start` set, lines are numbered
    /// from it, skipping added lines.
    pub fn new(raw: &str, diff: bool, numbering_start: Option<i64>) -> Result<Self> {
        let normalized = normalize(raw);

        let mut records = Vec::new();
        for (index, line) in normalized.split('\n').enumerate() {
            let record = if diff {
                let mut chars = line.chars();
                let symbol = match chars.next() {
                    None => DiffSymbol::Context,
                    Some(c) => DiffSymbol::from_char(c).ok_or(Error::DiffSymbol {
                        line: index + 1,
                        symbol: c,
                    })?,
                };
                LineRecord {
                    text: chars.as_str().to_string(),
                    diff_symbol: Some(symbol),
                    ..Default::default()
                }
            } else {
                LineRecord {
                    text: line.to_string(),
                    ..Default::default()
                }
            };
            records.push(record);
        }

        let padding = match numbering_start {
            Some(start) => number_lines(&mut records, start)?,
            None => None,
        };

        Ok(Self { records, padding })
    }

    /// The text handed to the highlighter (and hashed): stripped lines joined
    /// with `\n`.
    pub fn highlight_input(&self) -> String {
        self.records
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize line endings, then trim leading and trailing newlines.
fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim_matches('\n')
        .to_string()
}

/// Assign numbers and paddings; returns the gutter padding.
fn number_lines(records: &mut [LineRecord], start: i64) -> Result<Option<String>> {
    let mut numbered = 0;
    for record in records.iter_mut() {
        if record.diff_symbol == Some(DiffSymbol::Added) {
            continue;
        }
        let number = start.checked_add(numbered).ok_or_else(|| {
            Error::MetaParse(format!(
                "lineNumbersOffset {start} overflows when numbering {} lines",
                numbered + 1
            ))
        })?;
        record.line_number = Some(number.to_string());
        numbered += 1;
    }

    let Some(max_len) = records
        .iter()
        .filter_map(|r| r.line_number.as_ref())
        .map(|n| n.chars().count())
        .max()
    else {
        return Ok(None);
    };

    for record in records.iter_mut() {
        let len = record
            .line_number
            .as_ref()
            .map_or(0, |n| n.chars().count());
        record.line_number_padding = spaces(max_len - len);
    }

    Ok(spaces(max_len))
}

fn spaces(width: usize) -> Option<String> {
    (width > 0).then(|| " ".repeat(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    /// Drop line breaks so each generated string is one line.
    fn single_line(text: &str) -> String {
        text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
    }

    fn numbers(lines: &SourceLines) -> Vec<Option<&str>> {
        lines
            .records
            .iter()
            .map(|r| r.line_number.as_deref())
            .collect()
    }

    #[test]
    fn test_trims_surrounding_newlines_only() {
        let lines = SourceLines::new("\n\n  a\n\n b  \n\n", false, None).unwrap();
        assert_eq!(lines.highlight_input(), "  a\n\n b  ");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_normalizes_line_endings() {
        let lines = SourceLines::new("a\r\nb\rc\r\n", false, None).unwrap();
        assert_eq!(lines.highlight_input(), "a\nb\nc");
    }

    #[test]
    fn test_plain_mode_has_no_symbols() {
        let lines = SourceLines::new("-a\n+b", false, None).unwrap();
        assert!(lines.records.iter().all(|r| r.diff_symbol.is_none()));
        assert_eq!(lines.highlight_input(), "-a\n+b");
    }

    #[test]
    fn test_diff_mode_strips_symbols() {
        let source = indoc! {"
             unchanged
            -removed
            +added
        "};
        let lines = SourceLines::new(source, true, None).unwrap();
        let symbols: Vec<_> = lines.records.iter().map(|r| r.diff_symbol).collect();
        assert_eq!(
            symbols,
            [
                Some(DiffSymbol::Context),
                Some(DiffSymbol::Removed),
                Some(DiffSymbol::Added)
            ]
        );
        assert_eq!(lines.highlight_input(), "unchanged\nremoved\nadded");
    }

    #[test]
    fn test_diff_round_trip() {
        let source = " a\n-b\n+c\n  d\n--e";
        let lines = SourceLines::new(source, true, None).unwrap();
        let rebuilt: Vec<String> = lines
            .records
            .iter()
            .map(|r| format!("{}{}", r.diff_symbol.map_or(' ', DiffSymbol::as_char), r.text))
            .collect();
        assert_eq!(rebuilt.join("\n"), source);
    }

    #[test]
    fn test_diff_empty_line_is_context() {
        let lines = SourceLines::new("-a\n\n+b", true, None).unwrap();
        assert_eq!(lines.records[1].diff_symbol, Some(DiffSymbol::Context));
        assert_eq!(lines.records[1].text, "");
    }

    #[test]
    fn test_invalid_diff_symbol_names_line() {
        let err = SourceLines::new(" ok\n-ok\nbad", true, None).unwrap_err();
        assert!(matches!(err, Error::DiffSymbol { line: 3, symbol: 'b' }));
    }

    #[test]
    fn test_numbering_skips_added_lines() {
        let lines = SourceLines::new("-a\n b\n+c", true, Some(5)).unwrap();
        assert_eq!(numbers(&lines), [Some("5"), Some("6"), None]);
        // Added line pads to the widest number.
        assert_eq!(
            lines.records[2].line_number_padding.as_deref(),
            Some(" ")
        );
        assert_eq!(lines.records[0].line_number_padding, None);
        assert_eq!(lines.padding.as_deref(), Some(" "));
    }

    #[test]
    fn test_numbering_padding_right_aligns() {
        let source = (1..=10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let lines = SourceLines::new(&source, false, Some(1)).unwrap();
        assert_eq!(lines.records[0].line_number_padding.as_deref(), Some(" "));
        assert_eq!(lines.records[9].line_number.as_deref(), Some("10"));
        assert_eq!(lines.records[9].line_number_padding, None);
        assert_eq!(lines.padding.as_deref(), Some("  "));
    }

    #[test]
    fn test_numbering_all_added_emits_nothing() {
        let lines = SourceLines::new("+a\n+b", true, Some(1)).unwrap();
        assert_eq!(numbers(&lines), [None, None]);
        assert!(lines.records.iter().all(|r| r.line_number_padding.is_none()));
        assert_eq!(lines.padding, None);
    }

    #[test]
    fn test_no_numbering() {
        let lines = SourceLines::new("a\nb", false, None).unwrap();
        assert_eq!(numbers(&lines), [None, None]);
        assert_eq!(lines.padding, None);
    }

    #[test]
    fn test_negative_offset() {
        let lines = SourceLines::new("a\nb\nc", false, Some(-1)).unwrap();
        assert_eq!(numbers(&lines), [Some("-1"), Some("0"), Some("1")]);
        assert_eq!(lines.records[1].line_number_padding.as_deref(), Some(" "));
    }

    #[test]
    fn test_offset_overflow_is_rejected() {
        let err = SourceLines::new("a\nb", false, Some(i64::MAX)).unwrap_err();
        assert!(matches!(&err, Error::MetaParse(msg) if msg.contains("lineNumbersOffset")));
    }

    #[test]
    fn test_offset_at_max_numbers_a_single_line() {
        let lines = SourceLines::new("only", false, Some(i64::MAX)).unwrap();
        let max = i64::MAX.to_string();
        assert_eq!(numbers(&lines), [Some(max.as_str())]);

        // Added lines take no number, so they can't overflow either.
        let lines = SourceLines::new(" a\n+b", true, Some(i64::MAX)).unwrap();
        assert_eq!(numbers(&lines), [Some(max.as_str()), None]);
    }

    #[quickcheck]
    fn prop_plain_mode_keeps_every_line(lines: Vec<String>, crlf: bool) -> TestResult {
        let lines: Vec<String> = lines.iter().map(|l| single_line(l)).collect();
        match (lines.first(), lines.last()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {}
            _ => return TestResult::discard(),
        }
        let source = lines.join(if crlf { "\r\n" } else { "\n" });

        let parsed = SourceLines::new(&source, false, None).unwrap();
        TestResult::from_bool(parsed.len() == lines.len() && parsed.highlight_input() == lines.join("\n"))
    }

    #[quickcheck]
    fn prop_diff_strip_then_reprefix_round_trips(lines: Vec<(u8, String)>, offset: i32) -> TestResult {
        if lines.is_empty() {
            return TestResult::discard();
        }
        let original: Vec<String> = lines
            .iter()
            .map(|(symbol, text)| {
                let symbol = [' ', '-', '+'][usize::from(*symbol) % 3];
                format!("{symbol}{}", single_line(text))
            })
            .collect();

        let parsed = SourceLines::new(&original.join("\n"), true, Some(i64::from(offset))).unwrap();
        let rebuilt: Vec<String> = parsed
            .records
            .iter()
            .map(|r| {
                let symbol = r.diff_symbol.map_or(' ', DiffSymbol::as_char);
                format!("{symbol}{}", r.text)
            })
            .collect();

        let added = original.iter().filter(|l| l.starts_with('+')).count();
        let numbered = parsed.records.iter().filter(|r| r.line_number.is_some()).count();
        TestResult::from_bool(rebuilt == original && numbered == original.len() - added)
    }
}
