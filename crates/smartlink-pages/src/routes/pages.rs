//! Public SmartLink routes.
//!
//! Handles `GET /sl/{shortId}.html` and `GET /s/{shortId}`. Each request is
//! decided on its own:
//!
//! - a static page exists for the short id: serve it
//! - otherwise: serve the app shell and let the client-side router resolve
//!   the route (including its own "not found" view)
//!
//! Static pages already carry crawler metadata and a redirect for humans,
//! so there is no user-agent branching. Visitors never see an error here:
//! an unreadable page is logged and downgraded to the app shell.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::render::components::CSP_HEADER;
use crate::state::AppState;
use crate::store::PageStore;

/// Cache-Control for static pages: short browser TTL, longer CDN TTL.
const STATIC_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=3600, stale-while-revalidate=600";

/// How a SmartLink request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Cached page contents.
    Static(String),
    /// Single-page application fallback.
    App,
}

/// Decide between the cached page and the app fallback for `short_id`.
pub async fn decide(store: &PageStore, short_id: &str) -> RouteDecision {
    if !store.exists(short_id).await {
        tracing::debug!(short_id = %short_id, "no static page, serving app");
        return RouteDecision::App;
    }

    match store.read(short_id).await {
        Ok(html) => {
            tracing::debug!(short_id = %short_id, "serving static page");
            RouteDecision::Static(html)
        }
        Err(err) => {
            tracing::warn!(short_id = %short_id, error = %err, "static page unreadable, serving app");
            RouteDecision::App
        }
    }
}

/// `GET /sl/{shortId}.html`
pub async fn serve_html_page(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Response {
    let short_id = file.strip_suffix(".html").unwrap_or(&file);
    serve(&state, short_id, &headers).await
}

/// `GET /s/{shortId}`
pub async fn serve_short_page(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    serve(&state, &short_id, &headers).await
}

async fn serve(state: &AppState, short_id: &str, request_headers: &HeaderMap) -> Response {
    match decide(&state.store, short_id.trim()).await {
        RouteDecision::Static(html) => static_response(html, request_headers),
        RouteDecision::App => app_response(state.shell.document().await),
    }
}

/// Build the response for a cached page, honouring `If-None-Match`.
fn static_response(html: String, request_headers: &HeaderMap) -> Response {
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(STATIC_CACHE_CONTROL),
    );
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|t| t.trim() == etag));
    if not_modified {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    (StatusCode::OK, headers, html).into_response()
}

/// Serve the app shell. Never cached: the app itself decides what to show.
fn app_response(document: Arc<str>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        document.to_string(),
    )
        .into_response()
}
