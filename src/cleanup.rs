//! Cleanup pass: drop sections emptied by relocation or repeated runs, and
//! keep demo numbering compact.

use crate::scan::{self, SectionIndex, Span};

/// Remove every section whose content is pure whitespace. Whitespace-only
/// content cannot contain tags, so such sections are always leaves; removal
/// repeats until no candidates remain.
pub fn remove_empty_sections(body: &str) -> String {
    let mut cur = body.to_string();
    loop {
        let idx = SectionIndex::build(&cur);
        let empties: Vec<(Span, Span)> = idx
            .sections()
            .iter()
            .filter_map(|s| s.close.map(|c| (s.open, c)))
            .filter(|(open, close)| cur[open.end..close.start].trim().is_empty())
            .collect();
        if empties.is_empty() {
            return cur;
        }
        let mut next = String::with_capacity(cur.len());
        let mut pos = 0usize;
        for (open, close) in &empties {
            next.push_str(&cur[pos..open.start]);
            pos = close.end;
        }
        next.push_str(&cur[pos..]);
        cur = next;
    }
}

/// If a `demo-2` section survived while `demo` did not, rename it so the
/// numbering stays compact.
pub fn renumber_demo_sections(body: &str) -> String {
    let idx = SectionIndex::build(body);
    let mut demo_2_open: Option<Span> = None;
    for sec in idx.sections() {
        let tag = &body[sec.open.start..sec.open.end];
        match scan::attr_value(tag, "id") {
            Some("demo") => return body.to_string(),
            Some("demo-2") if demo_2_open.is_none() => demo_2_open = Some(sec.open),
            _ => {}
        }
    }
    let Some(open) = demo_2_open else {
        return body.to_string();
    };
    let tag = &body[open.start..open.end];
    let Some(value) = scan::attr_value_span(tag, "id") else {
        return body.to_string();
    };
    let mut out = String::with_capacity(body.len());
    out.push_str(&body[..open.start + value.start]);
    out.push_str("demo");
    out.push_str(&body[open.start + value.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_sections_are_removed() {
        let body = "<p>a</p>\n<section id=\"x\" section-title=\"X\">\n   \n</section>\n<p>b</p>";
        assert_eq!(remove_empty_sections(body), "<p>a</p>\n\n<p>b</p>");
    }

    #[test]
    fn nesting_collapses_to_fixpoint() {
        let body = "<section id=\"a\"><section id=\"b\">  </section> </section>";
        assert_eq!(remove_empty_sections(body), "");
    }

    #[test]
    fn sections_with_text_survive() {
        let body = "<section id=\"x\" section-title=\"X\"><p>kept</p></section>";
        assert_eq!(remove_empty_sections(body), body);
    }

    #[test]
    fn unterminated_sections_are_not_removed() {
        let body = "<section id=\"x\">   ";
        assert_eq!(remove_empty_sections(body), body);
    }

    #[test]
    fn orphan_demo_2_is_renamed() {
        let body = "<section id=\"demo-2\" section-title=\"Interactive Demo\"><p>w</p></section>";
        let out = renumber_demo_sections(body);
        assert!(out.contains("<section id=\"demo\" section-title=\"Interactive Demo\">"));
        assert!(!out.contains("demo-2"));
    }

    #[test]
    fn demo_2_keeps_its_id_while_demo_exists() {
        let body = concat!(
            "<section id=\"demo\" section-title=\"Interactive Demo\"><p>a</p></section>",
            "<section id=\"demo-2\" section-title=\"Interactive Demo\"><p>b</p></section>"
        );
        assert_eq!(renumber_demo_sections(body), body);
    }

    #[test]
    fn non_section_demo_ids_do_not_block_the_rename() {
        let body = "<div id=\"demo\"></div><section id=\"demo-2\"><p>w</p></section>";
        let out = renumber_demo_sections(body);
        assert!(out.contains("<section id=\"demo\"><p>w</p></section>"));
    }
}
