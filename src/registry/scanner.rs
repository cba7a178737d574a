use std::ffi::OsStr;
use std::io;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::errors::WikiError;
use crate::registry::page::Page;

/// Check if a file is markdown
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|s| s.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Walk `root` and build a page for every Markdown file at any depth.
///
/// Entries are visited in file name order. Hidden directories such as
/// `.git` are not descended into. The first unreadable directory or file
/// aborts the scan.
pub fn scan_dir(root: &Path) -> Result<Vec<Page>, WikiError> {
    let mut pages = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        pages.push(Page::load(root, entry.into_path())?);
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_finds_pages_at_any_depth() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "Home.md", "# Home");
        write(root, "a/One.md", "# One");
        write(root, "a/b/Two.md", "# Two");
        write(root, "a/b/c/d/Three.md", "---\ntags: [deep]\n---\n");
        write(root, "a/notes.txt", "not markdown");
        write(root, "image.png", "");

        let pages = scan_dir(root).unwrap();
        let uris: Vec<_> = pages.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(uris, ["/Home", "/a/One", "/a/b/Two", "/a/b/c/d/Three"]);
        assert_eq!(pages[3].tags(), ["deep"]);
    }

    #[test]
    fn test_order_is_stable() {
        let dir = TempDir::new().unwrap();
        for name in ["c.md", "a.md", "b.md", "sub/z.md"] {
            write(dir.path(), name, "");
        }
        let first: Vec<_> = scan_dir(dir.path()).unwrap().into_iter().map(|p| p.uri).collect();
        let second: Vec<_> = scan_dir(dir.path()).unwrap().into_iter().map(|p| p.uri).collect();
        assert_eq!(first, second);
        assert_eq!(first, ["/a", "/b", "/c", "/sub/z"]);
    }

    #[test]
    fn test_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".git/README.md", "");
        write(dir.path(), "Page.md", "");
        let pages = scan_dir(dir.path()).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = scan_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, WikiError::Io(_)));
    }

    #[test]
    fn test_malformed_meta_aborts_scan() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Good.md", "# ok");
        write(dir.path(), "Bad.md", "---\ndraft: [\n---\n");
        assert!(scan_dir(dir.path()).is_err());
    }
}
