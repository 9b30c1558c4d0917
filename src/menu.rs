//! Menu and sitemap side artifacts, built from the content tree alone:
//! `chapters.json` maps each chapter directory to its ordered entries, and
//! `sitemap.xml` carries one location per derived content path.

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;

use crate::error::Error;

/// Directory names that never appear in the menu, any capitalization.
const IGNORE_DIRS: &[&str] = &["old", "images", "figures"];

/// Chapter bucket that collects draft pages.
const DRAFTS_CHAPTER: &str = "More";
const DRAFTS_KEY: &str = "DRAFTS";

/// One menu entry: a page file name, or a subdirectory holding more
/// entries. Serializes to the shape the site menu consumes (a bare string,
/// or a single-key object).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MenuEntry {
    Page(String),
    Dir(BTreeMap<String, Vec<MenuEntry>>),
}

pub type Chapters = BTreeMap<String, Vec<MenuEntry>>;

fn ignored_dir(name: &str) -> bool {
    IGNORE_DIRS.iter().any(|d| name.eq_ignore_ascii_case(d))
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<(String, bool)>> {
    let mut names: Vec<(String, bool)> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| {
            let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (e.file_name().to_string_lossy().into_owned(), is_dir)
        })
        .collect();
    names.sort();
    Ok(names)
}

/// Recursively collect a directory's menu entries. Draft pages are
/// returned alongside the entries rather than accumulated through shared
/// state.
fn scan_dir(dir: &Path, prefix: &str) -> std::io::Result<(Vec<MenuEntry>, Vec<String>)> {
    let mut items = Vec::new();
    let mut drafts = Vec::new();
    for (name, is_dir) in sorted_entries(dir)? {
        if is_dir {
            if ignored_dir(&name) {
                continue;
            }
            let (sub, mut sub_drafts) =
                scan_dir(&dir.join(&name), &format!("{prefix}{name}/"))?;
            drafts.append(&mut sub_drafts);
            if !sub.is_empty() {
                items.push(MenuEntry::Dir(BTreeMap::from([(name, sub)])));
            }
        } else if name.to_lowercase().ends_with(".html") {
            if name.to_uppercase().contains("DRAFT") {
                drafts.push(format!("{prefix}{name}"));
            } else {
                items.push(MenuEntry::Page(name));
            }
        }
    }
    Ok((items, drafts))
}

/// Chapter map for the whole content root. Drafts across all chapters land
/// in a dedicated bucket under the `More` chapter.
pub fn build_chapters(content_root: &Path) -> std::io::Result<Chapters> {
    let mut chapters = Chapters::new();
    let mut drafts = Vec::new();
    for (name, is_dir) in sorted_entries(content_root)? {
        if !is_dir || ignored_dir(&name) {
            continue;
        }
        let (items, mut chapter_drafts) =
            scan_dir(&content_root.join(&name), &format!("{name}/"))?;
        drafts.append(&mut chapter_drafts);
        chapters.insert(name, items);
    }
    if !drafts.is_empty() {
        drafts.sort();
        let bucket = MenuEntry::Dir(BTreeMap::from([(
            DRAFTS_KEY.to_string(),
            drafts.into_iter().map(MenuEntry::Page).collect(),
        )]));
        chapters.entry(DRAFTS_CHAPTER.to_string()).or_default().push(bucket);
    }
    Ok(chapters)
}

/// Menu-style paths (`Chapter/Sub/Page`, `.html` stripped), `home` first.
pub fn menu_paths(chapters: &Chapters) -> Vec<String> {
    fn recurse(items: &[MenuEntry], prefix: &str, out: &mut Vec<String>) {
        for item in items {
            match item {
                MenuEntry::Page(name) => {
                    let stem = name.strip_suffix(".html").unwrap_or(name);
                    out.push(format!("{prefix}{stem}"));
                }
                MenuEntry::Dir(map) => {
                    for (key, sub) in map {
                        recurse(sub, &format!("{prefix}{key}/"), out);
                    }
                }
            }
        }
    }

    let mut paths = vec!["home".to_string()];
    for (chapter, items) in chapters {
        recurse(items, &format!("{chapter}/"), &mut paths);
    }
    paths
}

fn render_sitemap(paths: &[String], site_root: &str) -> Result<Vec<u8>, Error> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", "http://www.sitemaps.org/schemas/sitemap/0.9"));
    writer.write_event(Event::Start(urlset))?;
    for path in paths {
        let loc = format!("{site_root}?path={}", urlencoding::encode(path));
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        writer.write_event(Event::Start(BytesStart::new("loc")))?;
        writer.write_event(Event::Text(BytesText::new(&loc)))?;
        writer.write_event(Event::End(BytesEnd::new("loc")))?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    Ok(writer.into_inner().into_inner())
}

/// Write `chapters.json` and `sitemap.xml` under `out_dir`. Returns the
/// number of sitemap entries.
pub fn generate(content_root: &Path, site_root: &str, out_dir: &Path) -> Result<usize, Error> {
    let chapters = build_chapters(content_root)?;
    let paths = menu_paths(&chapters);

    fs::create_dir_all(out_dir)?;
    let json = serde_json::to_string_pretty(&chapters)?;
    fs::write(out_dir.join("chapters.json"), json)?;
    fs::write(out_dir.join("sitemap.xml"), render_sitemap(&paths, site_root)?)?;
    Ok(paths.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("Sorting/Advanced")).unwrap();
        fs::create_dir_all(root.join("Graphs")).unwrap();
        fs::create_dir_all(root.join("images")).unwrap();
        fs::write(root.join("Sorting/Bubble.html"), "x").unwrap();
        fs::write(root.join("Sorting/Advanced/Merge.html"), "x").unwrap();
        fs::write(root.join("Sorting/Heap_DRAFT.html"), "x").unwrap();
        fs::write(root.join("Graphs/BFS.html"), "x").unwrap();
        fs::write(root.join("Graphs/readme.txt"), "x").unwrap();
        fs::write(root.join("images/logo.html"), "x").unwrap();
        dir
    }

    #[test]
    fn chapters_nest_dirs_and_bucket_drafts() {
        let dir = fixture();
        let chapters = build_chapters(dir.path()).unwrap();
        let json = serde_json::to_value(&chapters).unwrap();

        assert_eq!(json["Graphs"], serde_json::json!(["BFS.html"]));
        assert_eq!(
            json["Sorting"],
            serde_json::json!([{ "Advanced": ["Merge.html"] }, "Bubble.html"])
        );
        assert_eq!(
            json["More"],
            serde_json::json!([{ "DRAFTS": ["Sorting/Heap_DRAFT.html"] }])
        );
        assert!(json.get("images").is_none());
    }

    #[test]
    fn menu_paths_start_at_home_and_strip_extensions() {
        let dir = fixture();
        let chapters = build_chapters(dir.path()).unwrap();
        let paths = menu_paths(&chapters);
        assert_eq!(paths[0], "home");
        assert!(paths.contains(&"Graphs/BFS".to_string()));
        assert!(paths.contains(&"Sorting/Advanced/Merge".to_string()));
        assert!(paths.contains(&"More/DRAFTS/Sorting/Heap_DRAFT".to_string()));
    }

    #[test]
    fn sitemap_encodes_paths_into_query_strings() {
        let paths = vec!["home".to_string(), "Sorting/Advanced/Merge".to_string()];
        let xml = render_sitemap(&paths, "https://example.edu/Algorithms/").unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains(
            "<loc>https://example.edu/Algorithms/?path=Sorting%2FAdvanced%2FMerge</loc>"
        ));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn generate_writes_both_artifacts() {
        let dir = fixture();
        let out = tempfile::tempdir().expect("tempdir");
        let count = generate(dir.path(), "https://example.edu/", out.path()).unwrap();
        assert!(count >= 4);
        assert!(out.path().join("chapters.json").exists());
        assert!(out.path().join("sitemap.xml").exists());
    }
}
