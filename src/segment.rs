//! Heading-driven segmentation: every level-2 heading that is not already
//! inside a section starts a new one, with an id slugified from its text.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::normalize;
use crate::scan::{self, SectionIndex, Span};

/* =============================== Slugify ================================ */

static REMNANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>|&#?\w+;").expect("remnant pattern"));
static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("non-slug pattern"));
static RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").expect("run pattern"));

/// Id-safe slug of a section title. Compatibility-decomposes, lowercases,
/// strips tag and entity remnants, keeps word characters, collapses
/// whitespace/hyphen/underscore runs to single hyphens. An empty result
/// falls back to `section`.
pub fn slugify(title: &str) -> String {
    let decomposed: String = title.nfkd().collect();
    let lowered = decomposed.to_lowercase();
    let no_remnants = REMNANT_RE.replace_all(&lowered, " ");
    let kept = NON_SLUG_RE.replace_all(&no_remnants, "");
    let collapsed = RUN_RE.replace_all(kept.trim(), "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/* ============================= Segmentation ============================= */

/// Full segmenter pass: wrap free level-2 headings, re-normalize titles,
/// then collapse duplicate outer/inner pairs left over from re-runs.
pub fn run(body: &str) -> String {
    let wrapped = wrap_heading_sections(body);
    let titled = normalize::attach_section_titles(&wrapped);
    collapse_duplicate_sections(&titled)
}

/// Wrap every `<h2>` that is not inside an existing section. A segment runs
/// from its heading to the next unwrapped heading, or to the end of the
/// body.
fn wrap_heading_sections(body: &str) -> String {
    let idx = SectionIndex::build(body);
    let free: Vec<scan::Heading> = scan::headings(body)
        .into_iter()
        .filter(|h| h.level == 2 && !idx.inside(h.span.start))
        .collect();
    if free.is_empty() {
        return body.to_string();
    }

    let mut used = scan::used_ids(body);
    let mut out = String::with_capacity(body.len() + free.len() * 64);
    let mut pos = 0usize;
    for (i, h) in free.iter().enumerate() {
        let seg_end = free.get(i + 1).map_or(body.len(), |next| next.span.start);
        let title = scan::heading_text(body, h);
        let id = scan::unique_id(&slugify(&title), &mut used);

        out.push_str(&body[pos..h.span.start]);
        out.push_str("<section id=\"");
        out.push_str(&id);
        out.push_str("\" section-title=\"");
        out.push_str(&normalize::escape_title(&title));
        out.push_str("\">\n");
        out.push_str(&body[h.span.start..seg_end]);
        out.push_str("\n</section>");
        pos = seg_end;
    }
    out.push_str(&body[pos..]);
    out
}

/// Collapse an outer/inner section pair that share identical id and title
/// and are separated only by whitespace. The inner open tag and the nearest
/// following close tag are deleted; the outer stays.
fn collapse_duplicate_sections(body: &str) -> String {
    let mut cur = body.to_string();
    loop {
        let Some((inner_open, close)) = find_duplicate_pair(&cur) else {
            return cur;
        };
        let mut next = String::with_capacity(cur.len());
        next.push_str(&cur[..inner_open.start]);
        match close {
            Some(c) => {
                next.push_str(&cur[inner_open.end..c.start]);
                next.push_str(&cur[c.end..]);
            }
            None => next.push_str(&cur[inner_open.end..]),
        }
        cur = next;
    }
}

fn find_duplicate_pair(body: &str) -> Option<(Span, Option<Span>)> {
    let idx = SectionIndex::build(body);
    let sections = idx.sections();
    for (i, outer) in sections.iter().enumerate() {
        let inner = sections.get(i + 1)?;
        if inner.open.start < outer.open.end
            || !body[outer.open.end..inner.open.start].trim().is_empty()
        {
            continue;
        }
        let outer_tag = &body[outer.open.start..outer.open.end];
        let inner_tag = &body[inner.open.start..inner.open.end];
        let same = |attr: &str| {
            matches!(
                (scan::attr_value(outer_tag, attr), scan::attr_value(inner_tag, attr)),
                (Some(a), Some(b)) if a == b
            )
        };
        if !same("id") || !same("section-title") {
            continue;
        }
        let close = inner.close;
        return Some((inner.open, close));
    }
    None
}
