//! sam - a Markdown wiki server
//!
//! Pages are read from a directory tree of Markdown files, indexed once at
//! startup into an immutable route table, and rendered per request. Page
//! history comes from the git repository the tree lives in.

pub mod app;
pub mod components;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod registry;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use app::{build_app, build_state, router};
pub use config::Config;
pub use errors::WikiError;
pub use registry::{Page, Route, RouteTable, Tags};
pub use services::{GitHistory, HistoryProvider, MarkdownService};
pub use types::{AppState, History, Link, TemplateContext};
