use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};

use crate::registry::page::Page;
use crate::types::Link;
use crate::utils::join_url;

/// Handler bound to one exact request path
#[derive(Debug, Clone)]
pub enum Route {
    /// Render the page, or its history with `?history`
    Page(Arc<Page>),
    /// Lowercase alias of a page, 301 to its canonical URI
    Alias { target: String },
    /// Entry of `redirects.conf`, 301 to the destination
    Redirect { target: String },
    TagIndex { links: Vec<Link> },
    Tag { name: String, links: Vec<Link> },
}

impl Route {
    /// Precedence when two routes claim the same path
    fn rank(&self) -> u8 {
        match self {
            Route::Alias { .. } => 0,
            Route::Redirect { .. } => 1,
            Route::Page(_) | Route::TagIndex { .. } | Route::Tag { .. } => 2,
        }
    }

    fn describe(&self) -> String {
        match self {
            Route::Page(p) => format!("page {}", p.uri),
            Route::Alias { target } => format!("alias of {}", target),
            Route::Redirect { target } => format!("redirect to {}", target),
            Route::TagIndex { .. } => "tag index".to_string(),
            Route::Tag { name, .. } => format!("tag {}", name),
        }
    }
}

/// Exact-path route table, built once at startup and read-only afterwards
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `route` at `path`.
    ///
    /// A route never replaces one of higher precedence (page, then redirect,
    /// then alias); with equal precedence the later route wins. Returns
    /// whether the route was installed.
    pub fn insert(&mut self, path: String, route: Route) -> bool {
        if let Some(existing) = self.routes.get(&path) {
            if existing.rank() > route.rank() {
                warn!("Route {} keeps {}, ignoring {}", path, existing.describe(), route.describe());
                return false;
            }
            warn!("Route {} replaces {} with {}", path, existing.describe(), route.describe());
        }
        self.routes.insert(path, route);
        true
    }

    pub fn get(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether any tag route was installed
    pub fn has_tags(&self) -> bool {
        self.routes.values().any(|r| matches!(r, Route::TagIndex { .. }))
    }
}

/// Install the canonical route of `page` and its lowercase alias.
///
/// The alias is skipped when it equals the canonical URI.
pub fn register_page(routes: &mut RouteTable, page: &Arc<Page>, base: &str) {
    let canonical = join_url(base, &page.uri);
    let alias = join_url(base, &page.alias_uri());
    info!("Registering page {}", canonical);
    routes.insert(canonical.clone(), Route::Page(Arc::clone(page)));
    if alias != canonical {
        routes.insert(alias, Route::Alias { target: canonical });
    }
}

/// Install a 301 redirect from `{base}/{src}` to `{base}/{dst}`
pub fn register_redirect(routes: &mut RouteTable, src: &str, dst: &str, base: &str) {
    let from = join_url(base, src);
    let to = join_url(base, dst);
    info!("Registering redirect {} -> {}", from, to);
    routes.insert(from, Route::Redirect { target: to });
}
