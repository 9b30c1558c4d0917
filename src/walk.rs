//! Content-tree traversal and encoding-tolerant file access.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;
use crate::transform;

/// Read a file as UTF-8, falling back to windows-1252 with character
/// substitution for legacy files. Returns the text and whether the
/// fallback was taken.
pub fn read_text_best_effort(path: &Path) -> io::Result<(String, bool)> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok((text, false)),
        Err(err) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok((text.into_owned(), true))
        }
    }
}

/// Write UTF-8 text, creating parent directories as needed (for mirrored
/// output trees).
pub fn write_text_utf8(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
}

/// Write only if the rewritten document still reads exactly like the
/// original.
pub fn write_verified(path: &Path, old_html: &str, new_html: &str) -> Result<(), Error> {
    if !transform::preserves_visible_text(old_html, new_html) {
        return Err(Error::TextNotPreserved(path.to_path_buf()));
    }
    write_text_utf8(path, new_html)?;
    Ok(())
}

pub fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("html"))
}

/// Does the file name carry the draft marker?
pub fn is_draft(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().to_uppercase().contains("DRAFT"))
}

fn html_files_under(root: &Path, exclude: Option<&str>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // The excluded subtree is pruned at the top level; no descent.
            !(entry.depth() == 1
                && entry.file_type().is_dir()
                && exclude.is_some_and(|ex| {
                    entry.file_name().to_string_lossy().eq_ignore_ascii_case(ex)
                }))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_html(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Resolve the target file set: explicit files and directories when given,
/// otherwise the whole content root minus the excluded subtree. Sorted and
/// de-duplicated.
pub fn collect_targets(root: &Path, explicit: &[PathBuf], exclude: &str) -> Vec<PathBuf> {
    let mut targets = if explicit.is_empty() {
        html_files_under(root, Some(exclude))
    } else {
        let mut out = Vec::new();
        for path in explicit {
            if path.is_dir() {
                out.extend(html_files_under(path, None));
            } else {
                out.push(path.clone());
            }
        }
        out
    };
    targets.sort();
    targets.dedup();
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn draft_marker_is_case_insensitive() {
        assert!(is_draft(Path::new("a/Sorting_draft.html")));
        assert!(is_draft(Path::new("a/DRAFT-intro.html")));
        assert!(!is_draft(Path::new("a/Sorting.html")));
    }

    #[test]
    fn traversal_skips_the_excluded_subtree_and_non_html() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("Ch1")).unwrap();
        fs::create_dir_all(root.join("Problems/Deep")).unwrap();
        fs::create_dir_all(root.join("NotProblems")).unwrap();
        fs::write(root.join("Ch1/a.html"), "x").unwrap();
        fs::write(root.join("Ch1/notes.txt"), "x").unwrap();
        fs::write(root.join("Problems/p.html"), "x").unwrap();
        fs::write(root.join("Problems/Deep/q.html"), "x").unwrap();
        fs::write(root.join("NotProblems/keep.html"), "x").unwrap();

        let targets = collect_targets(root, &[], "Problems");
        let names: Vec<String> = targets
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["Ch1/a.html", "NotProblems/keep.html"]);
    }

    #[test]
    fn explicit_paths_override_the_default_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("Ch1")).unwrap();
        fs::create_dir_all(root.join("Ch2")).unwrap();
        fs::write(root.join("Ch1/a.html"), "x").unwrap();
        fs::write(root.join("Ch2/b.html"), "x").unwrap();

        let explicit = vec![root.join("Ch2"), root.join("Ch2/b.html")];
        let targets = collect_targets(root, &explicit, "Problems");
        assert_eq!(targets, vec![root.join("Ch2/b.html")]);
    }

    #[test]
    fn latin1_bytes_fall_back_with_substitution() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("legacy.html");
        fs::write(&path, b"caf\xe9").unwrap();
        let (text, fell_back) = read_text_best_effort(&path).unwrap();
        assert!(fell_back);
        assert_eq!(text, "café");
    }

    #[test]
    fn verified_write_refuses_text_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.html");
        let old = "<body><p>hello</p></body>";
        let good = "<body><section><p>hello</p></section></body>";
        let bad = "<body><p>goodbye</p></body>";

        assert!(write_verified(&path, old, good).is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap(), good);

        let err = write_verified(&path, old, bad).unwrap_err();
        assert!(matches!(err, Error::TextNotPreserved(_)));
        // The earlier contents survive the refused write.
        assert_eq!(fs::read_to_string(&path).unwrap(), good);
    }
}
