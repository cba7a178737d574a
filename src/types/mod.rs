use std::sync::Arc;

use time::OffsetDateTime;

use crate::components::TemplateComponent;
use crate::config::Config;
use crate::registry::RouteTable;
use crate::services::{HistoryProvider, MarkdownService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub routes: Arc<RouteTable>,
    pub history: Arc<dyn HistoryProvider>,
    pub markdown: Arc<MarkdownService>,
    pub templates: Arc<TemplateComponent>,
    /// Navigation bar, identical on every page
    pub nav: Arc<String>,
    pub syntax_css: Arc<String>,
}

/// Link shown on tag listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub uri: String,
}

/// One commit in a page's history, with the derived author email hash
#[derive(Debug, Clone)]
pub struct History {
    pub id: String,
    pub short_id: String,
    pub author_name: String,
    pub author_email: String,
    pub email_hash: String,
    pub time: OffsetDateTime,
    pub summary: String,
}

/// Template rendering context
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub title: String,
    pub nav: String,
    pub content: String,
    pub actions: String,
}
