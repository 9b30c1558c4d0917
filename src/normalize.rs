//! Attribute normalizer: every `<section>` open tag gains a
//! `section-title` attribute when one can be inferred. Ids never change and
//! tags never move.

use crate::scan::{self, SectionIndex};

/// Fixed title for demo sections.
pub const DEMO_TITLE: &str = "Interactive Demo";

const TITLE_ATTR: &str = "section-title";
const DATA_TITLE_ATTR: &str = "data-section-title";

pub fn has_title_attr(open_tag: &str) -> bool {
    scan::has_attr(open_tag, TITLE_ATTR) || scan::has_attr(open_tag, DATA_TITLE_ATTR)
}

/// Attribute-safe rendition of an inferred title.
pub fn escape_title(title: &str) -> String {
    title.replace('"', "&quot;")
}

/// Add `section-title="..."` to every open tag that lacks one. Sections with
/// a `demo`-prefixed id get the fixed demo title; everything else takes the
/// nearest heading within its own content span. No readable title, no
/// attribute.
pub fn attach_section_titles(body: &str) -> String {
    let idx = SectionIndex::build(body);
    if idx.sections().is_empty() {
        return body.to_string();
    }
    let headings = scan::headings(body);

    let mut out = String::with_capacity(body.len() + 64);
    let mut pos = 0usize;
    for sec in idx.sections() {
        let open_tag = &body[sec.open.start..sec.open.end];
        if has_title_attr(open_tag) {
            continue;
        }
        let title = match scan::attr_value(open_tag, "id") {
            Some(id) if id.starts_with("demo") => DEMO_TITLE.to_string(),
            _ => {
                let content_end = sec.content_end(body.len());
                headings
                    .iter()
                    .find(|h| h.span.start >= sec.content_start() && h.span.start < content_end)
                    .map(|h| scan::heading_text(body, h))
                    .unwrap_or_default()
            }
        };
        if title.is_empty() {
            continue;
        }
        // Splice the attribute in just before the closing '>'.
        out.push_str(&body[pos..sec.open.end - 1]);
        out.push_str(" section-title=\"");
        out.push_str(&escape_title(&title));
        out.push_str("\">");
        pos = sec.open.end;
    }
    out.push_str(&body[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_taken_from_first_heading_in_span() {
        let body = "<section id=\"x\">\n<h2>Problem Solved</h2>\n<p>text</p>\n</section>";
        let out = attach_section_titles(body);
        assert!(out.contains("<section id=\"x\" section-title=\"Problem Solved\">"));
    }

    #[test]
    fn demo_id_gets_fixed_title_without_heading() {
        let body = "<section id=\"demo\"><div>widget</div></section>";
        let out = attach_section_titles(body);
        assert!(out.contains("section-title=\"Interactive Demo\""));
    }

    #[test]
    fn existing_titles_are_left_alone() {
        let body = "<section id=\"x\" section-title=\"Kept\"><h2>Other</h2></section>";
        assert_eq!(attach_section_titles(body), body);
    }

    #[test]
    fn data_prefixed_title_counts_as_present() {
        let body = "<section data-section-title=\"Kept\"><h2>Other</h2></section>";
        assert_eq!(attach_section_titles(body), body);
    }

    #[test]
    fn heading_outside_the_section_is_not_used() {
        let body = "<section id=\"x\"><p>no heading</p></section>\n<h2>After</h2>";
        assert_eq!(attach_section_titles(body), body);
    }

    #[test]
    fn quotes_in_titles_are_escaped() {
        let body = "<section><h3>The \"Best\" Case</h3></section>";
        let out = attach_section_titles(body);
        assert!(out.contains("section-title=\"The &quot;Best&quot; Case\""));
    }

    #[test]
    fn unterminated_section_still_gains_a_title() {
        let body = "<section id=\"x\">\n<h2>Tail</h2>\n<p>text</p>";
        let out = attach_section_titles(body);
        assert!(out.contains("section-title=\"Tail\""));
    }
}
