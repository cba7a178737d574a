//! Page and tag registry.
//!
//! The wiki root is scanned once at startup; every page, tag and redirect is
//! installed into a [`RouteTable`] that stays immutable while serving.

pub mod page;
pub mod routes;
pub mod scanner;
pub mod tags;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::config::Config;
use crate::errors::WikiError;

pub use page::Page;
pub use routes::{register_page, register_redirect, Route, RouteTable};
pub use scanner::scan_dir;
pub use tags::{Tag, Tags};

/// Result of the startup scan
pub struct Registry {
    pub routes: RouteTable,
    pub pages: Vec<Arc<Page>>,
    pub tags: Tags,
}

/// Parse a `redirects.conf` document of `source: destination` pairs.
///
/// Keys and values may be any YAML scalar; `2024: archive/2024` is read as text.
pub fn parse_redirects(text: &str) -> Result<BTreeMap<String, String>, WikiError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    if value.is_null() {
        return Ok(BTreeMap::new());
    }
    let mapping: serde_yaml::Mapping = serde_yaml::from_value(value)?;
    let mut redirects = BTreeMap::new();
    for (src, dst) in &mapping {
        redirects.insert(scalar_to_string(src)?, scalar_to_string(dst)?);
    }
    Ok(redirects)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Result<String, WikiError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(WikiError::Yaml(serde::de::Error::custom(format!(
            "redirect entries must be scalars, found {:?}",
            other
        )))),
    }
}

fn load_redirects(path: &Path) -> Result<BTreeMap<String, String>, WikiError> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    info!("Redirects config found");
    parse_redirects(&fs::read_to_string(path)?)
}

/// Scan the wiki root and install every route
pub fn build(config: &Config) -> Result<Registry, WikiError> {
    let base = config.base.as_str();
    let mut routes = RouteTable::new();

    for (src, dst) in load_redirects(&config.redirects_file())? {
        register_redirect(&mut routes, &src, &dst, base);
    }

    info!("Reading directory {}...", config.dir.display());
    let pages: Vec<Arc<Page>> = scan_dir(&config.dir)?.into_iter().map(Arc::new).collect();
    info!("Found {} pages", pages.len());

    info!("Registering pages...");
    let mut tags = Tags::new();
    for page in &pages {
        register_page(&mut routes, page, base);
        tags.collect(page)?;
    }

    info!("Registering tags...");
    tags.register(&mut routes, base);

    Ok(Registry { routes, pages, tags })
}
