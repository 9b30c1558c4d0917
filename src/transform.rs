//! The pass pipeline and the transform-verify safety harness.
//!
//! Pass order is a hard dependency: the relocator assumes titles are
//! attached, cleanup assumes the segmenter and relocator have already
//! produced their candidate empty sections. Passes are never reordered.

use std::sync::LazyLock;

use regex::Regex;

use crate::{cleanup, demos, normalize, segment};

/// Result of transforming one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No body region; the file is skipped, not an error.
    NoBody,
    /// The pipeline was a no-op for this document.
    Unchanged,
    /// The full document text with the rewritten body spliced in.
    Changed { html: String },
}

static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<body[^>]*>)(.*?)(</body>)").expect("body pattern"));

/// Run the fixed pipeline over a body region.
pub fn transform_body(body: &str) -> String {
    let form = demos::classify(body);
    let mut cur = normalize::attach_section_titles(body);
    if let Some(form) = form {
        cur = demos::wrap_standalone(&cur, form);
        cur = demos::relocate_trailing(&cur, form);
    }
    cur = segment::run(&cur);
    cur = cleanup::remove_empty_sections(&cur);
    cleanup::renumber_demo_sections(&cur)
}

/// Transform the body region of a whole document, leaving everything
/// outside `<body>...</body>` untouched.
pub fn transform_document(html: &str) -> Outcome {
    let Some(caps) = BODY_RE.captures(html) else {
        return Outcome::NoBody;
    };
    let Some(inner) = caps.get(2) else {
        return Outcome::NoBody;
    };
    let new_inner = transform_body(inner.as_str());
    if new_inner == inner.as_str() {
        return Outcome::Unchanged;
    }
    let mut out = String::with_capacity(html.len() + 256);
    out.push_str(&html[..inner.start()]);
    out.push_str(&new_inner);
    out.push_str(&html[inner.end()..]);
    Outcome::Changed { html: out }
}

/* ============================= Visible text ============================= */

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("script pattern"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("style pattern"));
static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws pattern"));

fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "hellip" => "\u{2026}",
        "copy" => "\u{a9}",
        "times" => "\u{d7}",
        "minus" => "\u{2212}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        _ => return None,
    })
}

fn decode_entities(text: &str) -> String {
    // An unrecognized entity leaves the text undecoded; both sides of the
    // comparison go through the same path, so equality still holds.
    match quick_xml::escape::unescape_with(text, |name| html_entity(name)) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Reader-facing text: script and style blocks stripped, remaining markup
/// stripped, entities decoded, whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let no_script = SCRIPT_RE.replace_all(html, " ");
    let no_style = STYLE_RE.replace_all(&no_script, " ");
    let no_tags = ANY_TAG_RE.replace_all(&no_style, " ");
    let decoded = decode_entities(&no_tags);
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Does the rewritten document read exactly like the original?
pub fn preserves_visible_text(old_html: &str, new_html: &str) -> bool {
    visible_text(old_html) == visible_text(new_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_ignores_markup_and_scripts() {
        let html = concat!(
            "<body><script>var x = \"<section>\";</script>",
            "<style>h2 { color: red; }</style>",
            "<h2>Title</h2>\n<p>Some &amp; more\u{a0}text</p></body>"
        );
        // The decoded no-break space collapses like any other whitespace.
        assert_eq!(visible_text(html), "Title Some & more text");
    }

    #[test]
    fn unknown_entities_compare_equal_on_both_sides() {
        let old = "<p>a &weird; b</p>";
        let new = "<section><p>a &weird; b</p></section>";
        assert!(preserves_visible_text(old, new));
    }

    #[test]
    fn document_without_body_is_skipped() {
        assert_eq!(transform_document("<html><p>x</p></html>"), Outcome::NoBody);
    }

    #[test]
    fn untouched_document_reports_unchanged() {
        let html = "<html><body><p>plain prose, no headings</p></body></html>";
        assert_eq!(transform_document(html), Outcome::Unchanged);
    }

    #[test]
    fn only_the_body_region_is_rewritten() {
        let html = "<html><head><title>h2 here? <h2>no</h2></title></head>\n<body>\n<h2>Intro</h2>\n<p>x</p>\n</body></html>";
        let Outcome::Changed { html: out } = transform_document(html) else {
            panic!("expected a change");
        };
        assert!(out.starts_with("<html><head><title>h2 here? <h2>no</h2></title></head>\n<body>"));
        assert!(out.contains("<section id=\"intro\" section-title=\"Intro\">"));
        assert!(out.ends_with("</body></html>"));
    }

    #[test]
    fn pipeline_is_idempotent_on_a_mixed_document() {
        let body = concat!(
            "\n<h2>Problem Solved</h2>\n<p>prose</p>\n",
            "<div class=\"embeddedDemoContainer\"><iframe src=\"d.html\"></iframe></div>\n",
            "<h2>Time/Space Analysis</h2>\n<p>more</p>\n"
        );
        let once = transform_body(body);
        let twice = transform_body(&once);
        assert_eq!(once, twice);
    }
}
