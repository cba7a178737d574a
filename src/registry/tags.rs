use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};

use crate::errors::WikiError;
use crate::registry::page::Page;
use crate::registry::routes::{Route, RouteTable};
use crate::types::Link;
use crate::utils::{encode_path, join_url};

/// Tag name and the pages carrying it, in scan order
#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    pub pages: Vec<Arc<Page>>,
}

impl Tag {
    /// Links to the pages of this tag
    pub fn links(&self, base: &str) -> Vec<Link> {
        self.pages
            .iter()
            .map(|p| Link { name: p.name.clone(), uri: encode_path(&join_url(base, &p.uri)) })
            .collect()
    }
}

/// All tags found in page metadata. Write-once: there is no removal.
#[derive(Debug, Default)]
pub struct Tags {
    tags: Vec<Tag>,
    index: HashMap<String, usize>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new tag with no pages
    pub fn add(&mut self, name: &str) -> Result<(), WikiError> {
        if self.index.contains_key(name) {
            return Err(WikiError::TagAlreadyExists(name.to_string()));
        }
        self.index.insert(name.to_string(), self.tags.len());
        self.tags.push(Tag { name: name.to_string(), pages: Vec::new() });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.index.get(name).map(|&i| &self.tags[i])
    }

    /// Append `page` to an existing tag
    pub fn update(&mut self, name: &str, page: Arc<Page>) -> Result<(), WikiError> {
        let i = *self.index.get(name).ok_or_else(|| WikiError::TagNotFound(name.to_string()))?;
        self.tags[i].pages.push(page);
        Ok(())
    }

    /// Add every tag of `page` that is not known yet, then append the page to each.
    /// Blank names are skipped, they would map onto the tag index itself.
    pub fn collect(&mut self, page: &Arc<Page>) -> Result<(), WikiError> {
        for name in page.tags() {
            if name.trim().is_empty() {
                warn!("Ignoring blank tag on page {}", page.name);
                continue;
            }
            if self.get(name).is_none() {
                self.add(name)?;
            }
            self.update(name, Arc::clone(page))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Links to the per-tag listings
    pub fn links(&self, base: &str) -> Vec<Link> {
        self.tags
            .iter()
            .map(|t| Link { name: t.name.clone(), uri: encode_path(&tag_uri(base, &t.name)) })
            .collect()
    }

    /// Install `{base}/tags` and one `{base}/tags/{name}` route per tag.
    /// Nothing is installed when there are no tags.
    pub fn register(&self, routes: &mut RouteTable, base: &str) {
        if self.tags.is_empty() {
            return;
        }
        info!("Registering root for tags...");
        routes.insert(join_url(base, "/tags"), Route::TagIndex { links: self.links(base) });
        for tag in &self.tags {
            info!("Registering tag {}...", tag.name);
            routes.insert(
                tag_uri(base, &tag.name),
                Route::Tag { name: tag.name.clone(), links: tag.links(base) },
            );
        }
    }
}

/// Route path of a tag listing, not percent-encoded
pub fn tag_uri(base: &str, name: &str) -> String {
    join_url(base, &format!("/tags/{}", name))
}
