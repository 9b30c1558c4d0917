//! Lexical tag locator and nesting tracker.
//!
//! Everything here works on raw bytes with quote-aware tag scanning; no DOM
//! is ever built. One scan per pass collects the `<section>` and heading tag
//! positions, and a single stack match turns them into nested section spans.
//! An unmatched `<section>` open is treated as extending to the end of the
//! document rather than rejected.

use std::collections::HashSet;
use std::sync::LazyLock;

use memchr::memchr;
use regex::Regex;

/// Half-open byte range into a document body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/* ============================== Tag parsing ============================= */

#[derive(Clone, Copy, Debug)]
struct TagInfo<'a> {
    name: &'a [u8],
    is_end: bool,
}

#[inline]
fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

#[inline]
fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

/// Find the '>' for a tag starting at `i` (s[i] == '<'), being quote-aware.
fn find_tag_end(s: &[u8], mut i: usize) -> Option<usize> {
    let n = s.len();
    i += 1;
    let mut quote: u8 = 0;
    while i < n {
        let b = s[i];
        if quote != 0 {
            if b == quote {
                quote = 0;
            }
        } else if b == b'"' || b == b'\'' {
            quote = b;
        } else if b == b'>' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Extract tag name and end flag from raw `<...>` bytes.
fn parse_tag_info(tag: &[u8]) -> TagInfo<'_> {
    let n = tag.len();
    let mut i = 1;

    let mut is_end = false;
    if i < n && tag[i] == b'/' {
        is_end = true;
        i += 1;
    }
    while i < n && is_ws(tag[i]) {
        i += 1;
    }
    let start = i;
    while i < n && is_name_char(tag[i]) {
        i += 1;
    }
    TagInfo {
        name: &tag[start..i],
        is_end,
    }
}

fn heading_level(name: &[u8]) -> Option<u8> {
    if name.len() == 2 && (name[0] == b'h' || name[0] == b'H') && name[1].is_ascii_digit() {
        let level = name[1] - b'0';
        if (1..=6).contains(&level) {
            return Some(level);
        }
    }
    None
}

/* ========================== Attribute scanning ========================== */

/// Byte span of the value of attribute `name` inside a raw open tag,
/// relative to the tag start. Quoted values exclude the quotes.
pub fn attr_value_span(tag: &str, name: &str) -> Option<Span> {
    let tag = tag.as_bytes();
    let len = tag.len();
    if len < 2 {
        return None;
    }
    let mut i = 1usize;

    while i < len && tag[i] != b'>' {
        while i < len && (is_ws(tag[i]) || tag[i] == b'/') {
            i += 1;
        }
        if i >= len || tag[i] == b'>' {
            break;
        }

        if !is_name_char(tag[i]) {
            // Not a valid name start; advance to avoid infinite loops.
            i += 1;
            continue;
        }
        let name_start = i;
        i += 1;
        while i < len && is_name_char(tag[i]) {
            i += 1;
        }
        let attr_name = &tag[name_start..i];
        let wanted = attr_name.eq_ignore_ascii_case(name.as_bytes());

        while i < len && is_ws(tag[i]) {
            i += 1;
        }

        if i < len && tag[i] == b'=' {
            i += 1;
            while i < len && is_ws(tag[i]) {
                i += 1;
            }
            if i >= len || tag[i] == b'>' {
                break;
            }

            if tag[i] == b'"' || tag[i] == b'\'' {
                let q = tag[i];
                i += 1;
                let value_start = i;
                while i < len && tag[i] != q {
                    i += 1;
                }
                if wanted {
                    return Some(Span {
                        start: value_start,
                        end: i,
                    });
                }
                if i < len && tag[i] == q {
                    i += 1;
                }
            } else {
                let value_start = i;
                while i < len && !is_ws(tag[i]) && tag[i] != b'>' {
                    i += 1;
                }
                if wanted {
                    return Some(Span {
                        start: value_start,
                        end: i,
                    });
                }
            }
        } else if wanted {
            // Bare attribute with no value.
            return Some(Span {
                start: name_start,
                end: name_start,
            });
        }
    }
    None
}

pub fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    attr_value_span(tag, name).map(|s| &tag[s.start..s.end])
}

pub fn has_attr(tag: &str, name: &str) -> bool {
    attr_value_span(tag, name).is_some()
}

/* ============================ Document scan ============================= */

#[derive(Clone, Copy)]
enum RawTag {
    SectionOpen(Span),
    SectionClose(Span),
    HeadingOpen(u8, Span),
    HeadingClose(u8, Span),
}

/// One left-to-right scan over the body, collecting section and heading
/// tags in document order. Comments are skipped; an unterminated tag or
/// comment ends the scan.
fn collect_tags(body: &str) -> Vec<RawTag> {
    let s = body.as_bytes();
    let n = s.len();
    let mut tags = Vec::new();
    let mut i = 0usize;

    while i < n {
        let Some(lt) = memchr(b'<', &s[i..]).map(|off| i + off) else {
            break;
        };
        if s[lt..].starts_with(b"<!--") {
            // Tags inside comments do not count.
            match body[lt + 4..].find("-->") {
                Some(off) => {
                    i = lt + 4 + off + 3;
                    continue;
                }
                None => break,
            }
        }
        let Some(gt) = find_tag_end(s, lt) else {
            break;
        };
        let span = Span {
            start: lt,
            end: gt + 1,
        };
        let ti = parse_tag_info(&s[lt..=gt]);
        if ti.name.eq_ignore_ascii_case(b"section") {
            if ti.is_end {
                tags.push(RawTag::SectionClose(span));
            } else {
                tags.push(RawTag::SectionOpen(span));
            }
        } else if let Some(level) = heading_level(ti.name) {
            if ti.is_end {
                tags.push(RawTag::HeadingClose(level, span));
            } else {
                tags.push(RawTag::HeadingOpen(level, span));
            }
        }
        i = gt + 1;
    }
    tags
}

/* ============================ Section index ============================= */

/// A matched (or unterminated) `<section>` element.
#[derive(Clone, Copy, Debug)]
pub struct Section {
    pub open: Span,
    /// `None` means the open tag was never closed; the section runs to the
    /// end of the document.
    pub close: Option<Span>,
    /// 1 for top-level sections.
    pub depth: usize,
}

impl Section {
    #[inline]
    pub fn content_start(&self) -> usize {
        self.open.end
    }

    #[inline]
    pub fn content_end(&self, body_len: usize) -> usize {
        self.close.map_or(body_len, |c| c.start)
    }
}

/// Sorted `<section>` tag positions plus the matched-pair nesting structure,
/// rebuilt fresh from the current text at the start of every pass.
pub struct SectionIndex {
    opens: Vec<usize>,
    closes: Vec<usize>,
    sections: Vec<Section>,
}

impl SectionIndex {
    pub fn build(body: &str) -> Self {
        let mut opens = Vec::new();
        let mut closes = Vec::new();
        let mut stack: Vec<Span> = Vec::new();
        let mut sections = Vec::new();

        for tag in collect_tags(body) {
            match tag {
                RawTag::SectionOpen(span) => {
                    opens.push(span.start);
                    stack.push(span);
                }
                RawTag::SectionClose(span) => {
                    closes.push(span.start);
                    // A stray close with no matching open is ignored.
                    if let Some(open) = stack.pop() {
                        sections.push(Section {
                            open,
                            close: Some(span),
                            depth: stack.len() + 1,
                        });
                    }
                }
                _ => {}
            }
        }
        // Anything left open runs to the end of the document.
        for (i, open) in stack.drain(..).enumerate() {
            sections.push(Section {
                open,
                close: None,
                depth: i + 1,
            });
        }
        sections.sort_by_key(|s| s.open.start);

        SectionIndex {
            opens,
            closes,
            sections,
        }
    }

    /// Is `offset` inside at least one section?
    pub fn inside(&self, offset: usize) -> bool {
        let opens_before = self.opens.partition_point(|&p| p < offset);
        let closes_before = self.closes.partition_point(|&p| p < offset);
        opens_before > closes_before
    }

    /// Matched sections in document order of their open tags.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

/* =============================== Headings =============================== */

/// A heading element located lexically: open tag to the nearest following
/// close tag of the same level.
#[derive(Clone, Copy, Debug)]
pub struct Heading {
    pub level: u8,
    /// Whole element, open tag through close tag.
    pub span: Span,
    /// Markup between the open and close tags.
    pub inner: Span,
}

pub fn headings(body: &str) -> Vec<Heading> {
    let tags = collect_tags(body);
    let mut out = Vec::new();

    for (i, tag) in tags.iter().enumerate() {
        let RawTag::HeadingOpen(level, open) = *tag else {
            continue;
        };
        let close = tags[i + 1..].iter().find_map(|t| match *t {
            RawTag::HeadingClose(l, span) if l == level => Some(span),
            _ => None,
        });
        let (inner_end, elem_end) = match close {
            Some(c) => (c.start, c.end),
            None => (body.len(), body.len()),
        };
        out.push(Heading {
            level,
            span: Span {
                start: open.start,
                end: elem_end,
            },
            inner: Span {
                start: open.end,
                end: inner_end,
            },
        });
    }
    out
}

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup pattern"));
static WS_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws pattern"));

/// Reader-facing text of a heading: markup stripped, whitespace collapsed.
pub fn heading_text(body: &str, h: &Heading) -> String {
    let inner = &body[h.inner.start..h.inner.end];
    let stripped = MARKUP_RE.replace_all(inner, " ");
    WS_RUN_RE.replace_all(&stripped, " ").trim().to_string()
}

/* ============================= Id tracking ============================== */

static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bid\s*=\s*"([^"]*)""#).expect("id pattern"));

/// Every `id="..."` value in the document, not just section ids.
pub fn used_ids(body: &str) -> HashSet<String> {
    ID_ATTR_RE
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect()
}

/// First free id among `base`, `base-2`, `base-3`, ... and claim it.
pub fn unique_id(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut n = 1usize;
    while used.contains(&candidate) {
        n += 1;
        candidate = format!("{base}-{n}");
    }
    used.insert(candidate.clone());
    candidate
}

/* ================================ Tests ================================= */
