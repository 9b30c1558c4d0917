//! Embedded demo handling: classify the document's widget form, wrap bare
//! widgets in their own sections, and move widgets that trail a prose
//! section into a sibling demo section.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::DEMO_TITLE;
use crate::scan::{self, SectionIndex, Span};

/// Which demo markup the document carries. Form A (container div) wins over
/// form B (bare iframe); the two are never mixed within one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoForm {
    Container,
    Frame,
}

static CONTAINER_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<div\s+class="embeddedDemoContainer"[^>]*>"#).expect("container pattern")
});
static DIV_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</\s*div\s*>").expect("div close pattern"));
static FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<iframe\b[^>]*class="embeddedDemo"[^>]*>.*?</iframe>"#)
        .expect("frame pattern")
});

/// Decide the document's demo form before any mutation pass runs. A
/// container that never closes is not an instance, so such a document can
/// still fall back to frame form.
pub fn classify(body: &str) -> Option<DemoForm> {
    if !instances(body, DemoForm::Container).is_empty() {
        Some(DemoForm::Container)
    } else if !instances(body, DemoForm::Frame).is_empty() {
        Some(DemoForm::Frame)
    } else {
        None
    }
}

/// Every widget instance of `form`, in document order. A container runs
/// from its open tag to the nearest following `</div>`; a container with no
/// close at all is not an instance.
pub fn instances(body: &str, form: DemoForm) -> Vec<Span> {
    let mut spans = Vec::new();
    match form {
        DemoForm::Container => {
            let mut pos = 0usize;
            while let Some(open) = CONTAINER_OPEN_RE.find_at(body, pos) {
                match DIV_CLOSE_RE.find_at(body, open.end()) {
                    Some(close) => {
                        spans.push(Span {
                            start: open.start(),
                            end: close.end(),
                        });
                        pos = close.end();
                    }
                    None => pos = open.end(),
                }
            }
        }
        DemoForm::Frame => {
            for m in FRAME_RE.find_iter(body) {
                spans.push(Span {
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
    }
    spans
}

/// Wrap every widget that is not inside any section in its own demo
/// section.
pub fn wrap_standalone(body: &str, form: DemoForm) -> String {
    let idx = SectionIndex::build(body);
    let bare: Vec<Span> = instances(body, form)
        .into_iter()
        .filter(|s| !idx.inside(s.start))
        .collect();
    if bare.is_empty() {
        return body.to_string();
    }

    let mut used = scan::used_ids(body);
    let mut out = String::with_capacity(body.len() + bare.len() * 64);
    let mut pos = 0usize;
    for span in bare {
        let id = scan::unique_id("demo", &mut used);
        out.push_str(&body[pos..span.start]);
        out.push_str("<section id=\"");
        out.push_str(&id);
        out.push_str("\" section-title=\"");
        out.push_str(DEMO_TITLE);
        out.push_str("\">\n");
        out.push_str(&body[span.start..span.end]);
        out.push_str("\n</section>");
        pos = span.end;
    }
    out.push_str(&body[pos..]);
    out
}

struct Edit {
    span: Span,
    text: String,
}

/// Move a widget that is the trailing content of a top-level prose section
/// into a brand-new sibling demo section placed immediately after it.
///
/// All edits are computed against the original offsets and applied in one
/// batched rewrite. Sections are considered in reverse document order so
/// the rightmost relocation claims the bare `demo` id first.
pub fn relocate_trailing(body: &str, form: DemoForm) -> String {
    let idx = SectionIndex::build(body);
    if idx.sections().is_empty() {
        return body.to_string();
    }
    let demos = instances(body, form);
    if demos.is_empty() {
        return body.to_string();
    }

    let mut used = scan::used_ids(body);
    let mut edits: Vec<Edit> = Vec::new();
    for sec in idx.sections().iter().rev() {
        // Widgets nested below the top level belong to whoever wrapped them.
        if sec.depth != 1 {
            continue;
        }
        let Some(close) = sec.close else {
            continue;
        };
        let open_tag = &body[sec.open.start..sec.open.end];
        if let Some(id) = scan::attr_value(open_tag, "id") {
            if id.starts_with("demo") {
                continue;
            }
        }
        let demo_titled = scan::attr_value(open_tag, "section-title")
            .is_some_and(|t| t.eq_ignore_ascii_case(DEMO_TITLE));
        if demo_titled {
            continue;
        }

        let cs = sec.content_start();
        let ce = close.start;
        let trimmed_end = cs + body[cs..ce].trim_end().len();
        // The trimmed tail must be exactly one widget instance.
        let Some(demo) = demos
            .iter()
            .rev()
            .find(|d| d.start >= cs && d.end == trimmed_end)
        else {
            continue;
        };
        let kept_end = cs + body[cs..demo.start].trim_end().len();
        let id = scan::unique_id("demo", &mut used);

        edits.push(Edit {
            span: Span {
                start: kept_end,
                end: ce,
            },
            text: String::new(),
        });
        edits.push(Edit {
            span: Span {
                start: close.end,
                end: close.end,
            },
            text: format!(
                "\n<section id=\"{id}\" section-title=\"{DEMO_TITLE}\">\n{}\n</section>\n",
                &body[demo.start..demo.end]
            ),
        });
    }
    if edits.is_empty() {
        return body.to_string();
    }

    edits.sort_by_key(|e| e.span.start);
    let mut out = String::with_capacity(body.len() + 128);
    let mut pos = 0usize;
    for edit in &edits {
        out.push_str(&body[pos..edit.span.start]);
        out.push_str(&edit.text);
        pos = edit.span.end;
    }
    out.push_str(&body[pos..]);
    out
}
