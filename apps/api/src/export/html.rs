use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap());
static RE_RTL_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bdir\s*=\s*["']?rtl\b"#).unwrap());
// Opening tags of the block elements Word needs explicit direction on.
// Exact tag names only: `<pre>`, `<h4>`, `<link>` never match.
static RE_BLOCK_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(p|h[1-3]|ul|li|div)(\s[^>]*)?>").unwrap());
static RE_DIR_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(^|\s)dir\s*=").unwrap());

static RE_NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<head[^>]*>.*?</head>|<style[^>]*>.*?</style>|<script[^>]*>.*?</script>|<title[^>]*>.*?</title>",
    )
    .unwrap()
});
static RE_BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|ul|ol|h[1-6]|tr|section|header)>").unwrap()
});
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Inner content of `<body>`, or the whole input when there is no body tag.
pub fn extract_body(html: &str) -> &str {
    RE_BODY
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str())
}

/// True when the markup declares right-to-left direction anywhere.
pub fn declares_rtl(html: &str) -> bool {
    RE_RTL_DECL.is_match(html)
}

/// Adds `dir="rtl" align="right"` to every opening `p`, `h1`-`h3`, `ul`, `li`
/// and `div` tag that has no `dir` attribute of its own.
pub fn force_rtl_blocks(html: &str) -> Cow<'_, str> {
    RE_BLOCK_OPEN.replace_all(html, |caps: &Captures| {
        let attrs = caps.get(2).map_or("", |m| m.as_str());
        if RE_DIR_ATTR.is_match(attrs) {
            caps[0].to_string()
        } else {
            format!(r#"<{} dir="rtl" align="right"{attrs}>"#, &caps[1])
        }
    })
}

/// Visible text of the document, one block per line.
pub fn to_plain_text(html: &str) -> String {
    let body = extract_body(html);
    let without_meta = RE_NON_CONTENT.replace_all(body, "");
    let with_breaks = RE_BLOCK_BREAK.replace_all(&without_meta, "\n");
    let text = decode_entities(&RE_TAG.replace_all(&with_breaks, ""));

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
