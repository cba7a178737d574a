use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use log::warn;

use crate::errors::WikiError;
use crate::services::metadata_service::{parse_meta, read_meta, Meta};

/// One Markdown file of the wiki
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// File name without extension
    pub name: String,
    pub file_path: PathBuf,
    /// Root-relative path without extension, always starting with `/`
    pub uri: String,
    pub meta: Meta,
}

impl Page {
    /// Build a page for `file_path` under `root` with the given metadata
    pub fn new(root: &Path, file_path: PathBuf, meta: Meta) -> Result<Self, WikiError> {
        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or(WikiError::InvalidPath)?;
        let uri = page_uri(root, &file_path)?;
        Ok(Self { name, file_path, uri, meta })
    }

    /// Open `file_path` and build a page from its front matter.
    ///
    /// A missing front matter block is logged and leaves the metadata empty;
    /// any other read or parse failure is returned.
    pub fn load(root: &Path, file_path: PathBuf) -> Result<Self, WikiError> {
        let file = File::open(&file_path)?;
        let meta = match read_meta(BufReader::new(file)) {
            Ok(lines) => parse_meta(&lines)?,
            Err(WikiError::MetadataNotFound) => {
                warn!("Metadata for {} not found", file_path.display());
                Meta::default()
            }
            Err(e) => return Err(e),
        };
        Self::new(root, file_path, meta)
    }

    /// URI with the name segment lowercased, used as a case-insensitive alias
    pub fn alias_uri(&self) -> String {
        match self.uri.rsplit_once('/') {
            Some((dir, name)) => format!("{}/{}", dir, name.to_lowercase()),
            None => self.uri.to_lowercase(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.meta.tags
    }

    pub fn is_draft(&self) -> bool {
        self.meta.draft
    }
}

/// Strip `root` and the extension from `file_path`, joining segments with `/`
fn page_uri(root: &Path, file_path: &Path) -> Result<String, WikiError> {
    let relative = file_path.strip_prefix(root).map_err(|_| WikiError::InvalidPath)?;
    let relative = relative.with_extension("");
    let mut uri = String::new();
    for comp in relative.components() {
        match comp {
            Component::Normal(seg) => {
                uri.push('/');
                uri.push_str(&seg.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return Err(WikiError::InvalidPath),
        }
    }
    if uri.is_empty() {
        return Err(WikiError::InvalidPath);
    }
    Ok(uri)
}
