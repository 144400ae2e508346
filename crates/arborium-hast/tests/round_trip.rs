use arborium_hast::{Node, code_block_paths, node_at, parse_html, split_lines, text_content, to_html};
use indoc::indoc;

#[test]
fn test_rustdoc_like_page_round_trips() {
    let html = indoc! {r#"
        <!DOCTYPE html>
        <html lang="en"><head><meta charset="utf-8"><link rel="stylesheet" href="static.files/rustdoc.css"><title>lib - Rust</title><style>pre { tab-size: 4; }</style></head>
        <body class="rustdoc mod"><main><div class="docblock"><p>Use <code>x &lt; y</code>:</p>
        <pre class="language-toml"><code>[dependencies]
        arborium = "2"</code></pre>
        <script>if (a < b && c) { go(); }</script>
        </div></main></body></html>
    "#};
    let tree = parse_html(html).unwrap();
    assert_eq!(to_html(&tree), html);
}

#[test]
fn test_code_block_text_is_decoded() {
    let html = r#"<pre><code class="language-html">&lt;a href="x"&gt;&amp;&lt;/a&gt;</code></pre>"#;
    let tree = parse_html(html).unwrap();
    let paths = code_block_paths(&tree);
    assert_eq!(paths, vec![vec![0]]);

    let pre = node_at(&tree, &paths[0]).unwrap();
    assert_eq!(text_content(pre), r#"<a href="x">&</a>"#);
}

#[test]
fn test_split_highlighted_fragment() {
    let tree = parse_html("<a-s>\"multi\nline\"</a-s> <a-k>end</a-k>\n").unwrap();
    let lines = split_lines(tree.children());
    let rendered: Vec<String> = lines
        .iter()
        .map(|line| line.iter().map(to_html).collect())
        .collect();
    assert_eq!(
        rendered,
        [
            "<a-s>\"multi</a-s>",
            "<a-s>line\"</a-s> <a-k>end</a-k>",
            ""
        ]
    );
    assert!(matches!(tree, Node::Root(_)));
}

#[test]
fn test_named_references_are_decoded() {
    let tree = parse_html("<p>It&rsquo;s 2 &times; 3 &rarr; ok</p>").unwrap();
    assert_eq!(text_content(&tree), "It\u{2019}s 2 \u{d7} 3 \u{2192} ok");
    assert_eq!(to_html(&tree), "<p>It\u{2019}s 2 \u{d7} 3 \u{2192} ok</p>");
}

#[test]
fn test_implied_end_tags_do_not_nest_siblings() {
    let html = "<ul><li>one<li>two</ul><p>a<p>b";
    let tree = parse_html(html).unwrap();
    assert_eq!(
        to_html(&tree),
        "<ul><li>one</li><li>two</li></ul><p>a</p><p>b</p>"
    );
}
