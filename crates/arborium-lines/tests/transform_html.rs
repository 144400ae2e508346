use arborium_hast::{Element, Node, parse_fragment, split_lines};
use arborium_lines::{
    Error, HighlightError, Options, PlainHighlighter, SyncCodeBlocks, content_digest, from_fn,
    lines_to_pre,
};
use indoc::indoc;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

/// Wraps every word in `<a-k>`, the way arborium marks keywords, and
/// renders `// …` comments as a fold placeholder would appear.
fn keyword_highlighter(code: &str, language: Option<&str>) -> Result<Element, HighlightError> {
    if language == Some("cobol") {
        return Err(HighlightError::UnsupportedLanguage("cobol".into()));
    }
    let mut html = String::new();
    for (i, word) in code.split(' ').enumerate() {
        if i > 0 {
            html.push(' ');
        }
        if word.trim().is_empty() {
            html.push_str(word);
        } else {
            html.push_str(&format!("<a-k>{word}</a-k>"));
        }
    }
    let nodes = parse_fragment(&html).map_err(|e| HighlightError::Failed(e.to_string()))?;
    Ok(lines_to_pre(split_lines(&nodes)))
}

#[test]
fn test_document_without_code_blocks_round_trips() {
    let html = indoc! {r#"
        <!DOCTYPE html>
        <html><head><title>Docs</title></head>
        <body><pre>preformatted, no code</pre><p class="x">a &amp; b</p></body></html>
    "#};
    let (out, count) = SyncCodeBlocks::new(PlainHighlighter)
        .transform_html(html)
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(out, html);
}

#[test]
fn test_full_document() {
    let html = indoc! {r#"
        <h1>Change</h1>
        <pre><code class="language-rust-diff" data-meta="{ file: 'src/lib.rs', lineNumbers: true, lineNumbersOffset: 9 }">
         fn answer() -> u32 {
        -    41
        +    42
         }
        </code></pre>
        <p>done</p>
    "#};

    let mut blocks = SyncCodeBlocks::new(from_fn(keyword_highlighter));
    let (out, count) = blocks.transform_html(html).unwrap();
    assert_eq!(count, 1);

    let expected = indoc! {r#"
        <h1>Change</h1>
        <pre class="arborium" data-file="src/lib.rs" data-line-numbers="true" data-line-numbers-offset="9" data-language="rust" data-line-number-padding="  "><code data-file="src/lib.rs" data-line-numbers="true" data-line-numbers-offset="9" data-language="rust" data-line-number-padding="  "><span class="line" data-line-number="9" data-line-number-padding=" " data-diff-symbol=" "><a-k>fn</a-k> <a-k>answer()</a-k> <a-k>-&gt;</a-k> <a-k>u32</a-k> <a-k>{</a-k>
        </span><span class="line" data-line-number="10" data-diff-symbol="-">    <a-k>41</a-k>
        </span><span class="line" data-line-number-padding="  " data-diff-symbol="+">    <a-k>42</a-k>
        </span><span class="line" data-line-number="11" data-diff-symbol=" "><a-k>}</a-k>
        </span></code></pre>
        <p>done</p>
    "#};
    assert_eq!(out, expected);
}

#[test]
fn test_tokens_spanning_lines_and_folds() {
    let html = "<pre><code class=\"language-js\">a\n  // …\nb</code></pre>";
    let mut blocks = SyncCodeBlocks::new(from_fn(keyword_highlighter));
    let (out, _) = blocks.transform_html(html).unwrap();
    assert!(out.contains(
        "<span class=\"line folded\"><span class=\"fold-space\">   </span><span class=\"fold-marker\">…</span>\n</span>"
    ));
}

#[test]
fn test_unknown_language_falls_back_to_plain() {
    let html = "<pre><code class=\"language-cobol\">DISPLAY 'HI'</code></pre>";
    let mut blocks = SyncCodeBlocks::new(from_fn(keyword_highlighter));
    let (out, _) = blocks.transform_html(html).unwrap();
    assert!(out.contains(r#"data-language="cobol""#));

    let strict = Options::from_toml_str("ignore-unknown-language = false").unwrap();
    let mut blocks = SyncCodeBlocks::with_options(from_fn(keyword_highlighter), strict);
    assert!(matches!(
        blocks.transform_html(html),
        Err(Error::Highlight(HighlightError::UnsupportedLanguage(_)))
    ));
}

#[test]
fn test_content_hash_pins_stripped_text() {
    let digest = content_digest("a\nb");
    let html = format!(
        "<pre><code class=\"language-txt-diff\" data-meta=\"{{ contentHash: '{digest}' }}\">-a\n+b</code></pre>"
    );
    let (out, _) = SyncCodeBlocks::new(PlainHighlighter)
        .transform_html(&html)
        .unwrap();
    assert!(out.contains(&format!(r#"data-content-hash="{digest}""#)));

    let edited = html.replace("+b", "+c");
    let err = SyncCodeBlocks::new(PlainHighlighter)
        .transform_html(&edited)
        .unwrap_err();
    assert!(err.to_string().contains(&digest));
    assert!(err.to_string().contains(&content_digest("a\nc")));
}

#[test]
fn test_one_bad_block_fails_the_document() {
    let html = indoc! {r#"
        <pre><code class="language-a">fine</code></pre>
        <pre><code class="language-b-diff">?broken</code></pre>
    "#};
    let err = SyncCodeBlocks::new(PlainHighlighter)
        .transform_html(html)
        .unwrap_err();
    assert!(matches!(err, Error::DiffSymbol { line: 1, symbol: '?' }));
}

#[test]
fn test_line_count_preserved_without_diff() {
    for source in ["x", "a\nb", "a\n\n\nb", "  indented\n\ttabbed\n"] {
        let pre = Element::new("pre").with_child(Element::new("code").with_child(Node::text(source)));
        let out = SyncCodeBlocks::new(PlainHighlighter)
            .transform_block(&pre)
            .unwrap();
        let code = out.child_elements().next().unwrap();
        let expected = source.trim_matches('\n').split('\n').count();
        assert_eq!(code.child_elements().count(), expected, "{source:?}");
    }
}

#[test]
fn test_named_references_reach_the_highlighter_decoded() {
    let html = "<pre><code class=\"language-txt\">a &times; b &rarr; c</code></pre>";
    let (out, _) = SyncCodeBlocks::new(PlainHighlighter)
        .transform_html(html)
        .unwrap();
    assert!(out.contains("a \u{d7} b \u{2192} c"));
    assert!(!out.contains("&amp;times;"));

    // The hash covers the decoded text, not its spelling in the markup.
    let digest = content_digest("a \u{d7} b");
    let html = format!(
        "<pre><code data-meta=\"{{ contentHash: '{digest}' }}\">a &times; b</code></pre>"
    );
    assert!(SyncCodeBlocks::new(PlainHighlighter).transform_html(&html).is_ok());
}

#[test]
fn test_line_number_offset_overflow_is_an_error() {
    let html = indoc! {r#"
        <pre><code data-meta="{ lineNumbers: true, lineNumbersOffset: 9223372036854775807 }">a
        b</code></pre>
    "#};
    let err = SyncCodeBlocks::new(PlainHighlighter)
        .transform_html(html)
        .unwrap_err();
    assert!(matches!(&err, Error::MetaParse(msg) if msg.contains("lineNumbersOffset")));
}

#[quickcheck]
fn prop_line_count_preserved_without_diff(lines: Vec<String>) -> TestResult {
    let lines: Vec<String> = lines
        .iter()
        .map(|line| line.chars().filter(|c| !matches!(c, '\n' | '\r')).collect())
        .collect();
    match (lines.first(), lines.last()) {
        (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {}
        _ => return TestResult::discard(),
    }
    let pre = Element::new("pre")
        .with_child(Element::new("code").with_child(Node::text(lines.join("\n"))));
    let Ok(out) = SyncCodeBlocks::new(PlainHighlighter).transform_block(&pre) else {
        return TestResult::failed();
    };
    let Some(code) = out.child_elements().next() else {
        return TestResult::failed();
    };
    TestResult::from_bool(code.child_elements().count() == lines.len())
}
