use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use log::info;
use tower_http::services::{ServeDir, ServeFile};

use crate::components::{NavigationComponent, TemplateComponent};
use crate::config::Config;
use crate::errors::WikiError;
use crate::handlers::{handle_path, handle_syntax_css, log_request};
use crate::registry;
use crate::services::{markdown_service, GitHistory, HistoryProvider, MarkdownService};
use crate::types::AppState;

/// Scan the wiki and assemble the shared state
pub fn build_state(config: Config, history: Arc<dyn HistoryProvider>) -> Result<AppState, WikiError> {
    let registry = registry::build(&config)?;
    let drafts = registry.pages.iter().filter(|p| p.is_draft()).count();
    info!(
        "Registered {} pages ({} drafts), {} tags, {} routes",
        registry.pages.len(),
        drafts,
        registry.tags.len(),
        registry.routes.len()
    );

    let templates = TemplateComponent::load(&config)?;
    let nav = NavigationComponent::new(&config.base, &config.home, registry.routes.has_tags()).build_nav_html();

    Ok(AppState {
        config: Arc::new(config),
        routes: Arc::new(registry.routes),
        history,
        markdown: Arc::new(MarkdownService::new()),
        templates: Arc::new(templates),
        nav: Arc::new(nav),
        syntax_css: Arc::new(markdown_service::syntax_css()?),
    })
}

/// Fixed asset routes first, everything else through the route table
pub fn router(state: AppState) -> Router {
    let assets = state.config.assets_dir.clone();
    Router::new()
        .route_service("/favicon.ico", ServeFile::new(assets.join("favicon.ico")))
        .nest_service("/assets", ServeDir::new(assets))
        .route("/syntax.css", get(handle_syntax_css))
        .fallback(handle_path)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Build the application backed by git history
pub fn build_app(config: Config) -> Result<Router, WikiError> {
    Ok(router(build_state(config, Arc::new(GitHistory::new()))?))
}
