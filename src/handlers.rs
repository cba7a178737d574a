use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, RawQuery, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use log::{debug, error, info};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::components::templates::{article_html, history_html, links_html};
use crate::components::FabComponent;
use crate::errors::WikiError;
use crate::registry::{Page, Route};
use crate::types::{AppState, Link, TemplateContext};
use crate::utils::{decode_path, encode_path, has_query_key, join_url};

/// Log every request as `remote method uri`
pub async fn log_request(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    info!("{} {} {}", remote, request.method(), request.uri());
    next.run(request).await
}

/// 301 to `target`
pub fn moved_permanently(target: &str) -> Response {
    let location = HeaderValue::from_str(&encode_path(target))
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Dispatch every path that is not a fixed route through the route table
pub async fn handle_path(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    request: Request,
) -> Response {
    let path = decode_path(request.uri().path());
    let base = state.config.base.as_str();

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == base {
        return moved_permanently(&join_url(base, &state.config.home));
    }

    match state.routes.get(&path) {
        Some(Route::Page(page)) => {
            let page = Arc::clone(page);
            let result = if has_query_key(query.as_deref(), "history") {
                handle_history(&state, &page).await
            } else {
                handle_article(&state, &page)
            };
            result.unwrap_or_else(IntoResponse::into_response)
        }
        Some(Route::Alias { target }) | Some(Route::Redirect { target }) => {
            debug!("Redirecting {} -> {}", path, target);
            moved_permanently(target)
        }
        Some(Route::TagIndex { links }) => handle_links(&state, "Tags", links),
        Some(Route::Tag { name, links }) => handle_links(&state, name, links),
        None => handle_static(&state, request).await,
    }
}

fn handle_article(state: &AppState, page: &Page) -> Result<Response, WikiError> {
    let html = state.markdown.render_file(&page.file_path).map_err(|e| {
        error!("error read HTML for {}: {}", page.name, e);
        e
    })?;
    Ok(render_view(state, &page.name, article_html(page, &html), page_actions(state, page, false)))
}

async fn handle_history(state: &AppState, page: &Page) -> Result<Response, WikiError> {
    let provider = Arc::clone(&state.history);
    let file = page.file_path.clone();
    let history = tokio::task::spawn_blocking(move || provider.history(&file))
        .await
        .map_err(|e| WikiError::HistoryError(e.to_string()))
        .and_then(|r| r)
        .map_err(|e| {
            error!("error read git history for {}: {}", page.file_path.display(), e);
            e
        })?;
    let title = format!("History - {}", page.name);
    Ok(render_view(state, &title, history_html(page, &history), page_actions(state, page, true)))
}

fn handle_links(state: &AppState, title: &str, links: &[Link]) -> Response {
    render_view(state, title, links_html(title, links), String::new())
}

fn page_actions(state: &AppState, page: &Page, showing_history: bool) -> String {
    let fab = FabComponent::new();
    let actions = fab.generate_actions(&state.config.base, &page.uri, showing_history);
    fab.generate_fab_html(&actions)
}

fn render_view(state: &AppState, title: &str, content: String, actions: String) -> Response {
    let context = TemplateContext {
        title: title.to_string(),
        nav: state.nav.as_ref().clone(),
        content,
        actions,
    };
    Html(state.templates.render_shell_template(&context)).into_response()
}

/// Serve unmatched paths from the wiki's `static` directory, if it exists
async fn handle_static(state: &AppState, request: Request) -> Response {
    let static_dir = state.config.static_dir();
    if !static_dir.is_dir() {
        return WikiError::NotFound.into_response();
    }
    match ServeDir::new(static_dir).oneshot(request).await {
        Ok(resp) => resp.map(Body::new).into_response(),
        Err(e) => {
            error!("error serving static file: {}", e);
            WikiError::NotFound.into_response()
        }
    }
}

/// Stylesheet for highlighted code blocks
pub async fn handle_syntax_css(State(state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], state.syntax_css.as_ref().clone())
}
