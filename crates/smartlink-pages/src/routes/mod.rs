//! Route definitions for the SmartLink page service.
//!
//! ## Public
//!
//! - `GET /health` - Health check (JSON)
//! - `GET /robots.txt` - Crawler instructions
//! - `GET /sl/{shortId}.html` - Static page, or the app shell
//! - `GET /s/{shortId}` - Same, short form
//!
//! ## Admin (`/api/v1`, bearer token when configured)
//!
//! - `GET /static-pages` - List cached pages
//! - `POST /static-pages/generate` - Render and store one page
//! - `POST /static-pages/regenerate-all` - Rebuild every published page
//! - `DELETE /static-pages/{shortId}` - Remove a page (idempotent)

mod api;
mod health;
pub mod pages;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};

use crate::auth::require_auth;
use crate::state::AppState;

/// Build the complete service router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/static-pages", get(api::list_pages))
        .route("/static-pages/generate", post(api::generate_page))
        .route("/static-pages/regenerate-all", post(api::regenerate_all))
        .route("/static-pages/{short_id}", delete(api::delete_page))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/robots.txt", get(robots_txt))
        .route("/sl/{file}", get(pages::serve_html_page))
        .route("/s/{short_id}", get(pages::serve_short_page))
        .nest("/api/v1", admin)
        .with_state(state)
}

/// Serve robots.txt allowing all crawlers.
///
/// Link previews only work if crawlers can fetch the static pages.
async fn robots_txt() -> impl IntoResponse {
    (
        [("content-type", "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::record::{SmartLinkRecord, sample_record};
    use crate::source::MemorySource;

    const APP_INDEX: &str = r#"<!DOCTYPE html><html><body><div id="root"></div><script src="/app.js"></script></body></html>"#;

    struct Harness {
        _tmp: TempDir,
        app: Router,
        state: AppState,
    }

    fn harness_with(records: Vec<SmartLinkRecord>, tokens: &[&str]) -> Harness {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::for_tests(tmp.path().join("sl"));
        config.app_index = tmp.path().join("index.html");
        config.api_tokens = Arc::new(tokens.iter().map(|t| t.to_string()).collect::<HashSet<_>>());
        std::fs::write(&config.app_index, APP_INDEX).unwrap();

        let state = AppState::with_source(config, Arc::new(MemorySource::new(records)));
        Harness {
            _tmp: tmp,
            app: router(state.clone()),
            state,
        }
    }

    fn harness() -> Harness {
        harness_with(Vec::new(), &[])
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::delete(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    fn generate_body() -> Value {
        json!({
            "shortId": "abc123",
            "trackTitle": "Midnight",
            "artistName": "Jane Doe",
            "coverImageUrl": "https://cdn.example.com/cover.jpg",
            "platforms": [{"platform": "Spotify", "url": "https://open.spotify.com/x"}]
        })
    }

    #[tokio::test]
    async fn health_ok() {
        let h = harness();
        let response = send(&h.app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "smartlink-pages");
        assert_eq!(body["appShellLoaded"], false);
        assert_eq!(body["outputDirPresent"], false);
    }

    #[tokio::test]
    async fn health_reflects_shell_and_store() {
        let h = harness();
        send(&h.app, get("/s/unknown")).await;
        send(
            &h.app,
            post_json("/api/v1/static-pages/generate", generate_body()),
        )
        .await;

        let body = body_json(send(&h.app, get("/health")).await).await;
        assert_eq!(body["appShellLoaded"], true);
        assert_eq!(body["outputDirPresent"], true);
    }

    #[tokio::test]
    async fn robots_allows_crawlers() {
        let h = harness();
        let body = body_string(send(&h.app, get("/robots.txt")).await).await;
        assert!(body.contains("Allow: /"));
    }

    #[tokio::test]
    async fn unknown_page_falls_back_to_app() {
        let h = harness();
        let response = send(&h.app, get("/sl/unknown-id.html")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let body = body_string(response).await;
        assert!(body.contains(r#"<div id="root"></div>"#));
    }

    #[tokio::test]
    async fn generate_then_serve_static_page() {
        let h = harness();

        let response = send(
            &h.app,
            post_json("/api/v1/static-pages/generate", generate_body()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["shortId"], "abc123");
        assert_eq!(body["url"], "http://localhost:8082/sl/abc123.html");
        assert!(body["filePath"].as_str().unwrap().ends_with("abc123.html"));

        for uri in ["/sl/abc123.html", "/s/abc123"] {
            let response = send(&h.app, get(uri)).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "text/html; charset=utf-8"
            );
            assert!(response.headers().contains_key(header::ETAG));
            let html = body_string(response).await;
            assert!(html.contains(r#"<meta property="og:title" content="Midnight - Jane Doe">"#));
            assert!(html.contains(r#"window.location.replace("/#/smartlinks/jane-doe/midnight")"#));
            assert!(!html.contains(r#"<div id="root">"#));
        }
    }

    #[tokio::test]
    async fn generate_missing_field_is_400_and_writes_nothing() {
        let h = harness();
        let mut body = generate_body();
        body["coverImageUrl"] = json!("");

        let response = send(&h.app, post_json("/api/v1/static-pages/generate", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["fields"], json!(["coverImageUrl"]));
        assert!(!h.state.store.exists("abc123").await);
    }

    #[tokio::test]
    async fn generate_storage_failure_is_500() {
        let h = harness();
        std::fs::create_dir_all(h.state.store.path_for("abc123").unwrap()).unwrap();

        let response = send(
            &h.app,
            post_json("/api/v1/static-pages/generate", generate_body()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "storage_error");

        let leftovers: Vec<_> = std::fs::read_dir(h.state.store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn generate_malformed_body_is_400() {
        let h = harness();
        let request = Request::post("/api/v1/static-pages/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["fields"], json!(["body"]));
    }

    #[tokio::test]
    async fn escaped_title_served_from_cache() {
        let h = harness();
        let mut body = generate_body();
        body["trackTitle"] = json!("<script>alert(1)</script>");
        send(&h.app, post_json("/api/v1/static-pages/generate", body)).await;

        let html = body_string(send(&h.app, get("/sl/abc123.html")).await).await;
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let h = harness();
        send(
            &h.app,
            post_json("/api/v1/static-pages/generate", generate_body()),
        )
        .await;

        let first = send(&h.app, delete("/api/v1/static-pages/abc123")).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await["deleted"], true);

        for _ in 0..2 {
            let again = send(&h.app, delete("/api/v1/static-pages/abc123")).await;
            assert_eq!(again.status(), StatusCode::OK);
            let body = body_json(again).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["deleted"], false);
        }

        let response = send(&h.app, get("/sl/abc123.html")).await;
        assert!(body_string(response).await.contains(r#"<div id="root">"#));
    }

    #[tokio::test]
    async fn delete_malformed_id_succeeds() {
        let h = harness();
        let response = send(&h.app, delete("/api/v1/static-pages/bad.id")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["shortId"], "bad.id");
        assert_eq!(body["deleted"], false);
    }

    #[tokio::test]
    async fn regenerate_all_reports_partial_failure() {
        let broken = SmartLinkRecord {
            short_id: "two".to_string(),
            artist_name: String::new(),
            ..sample_record()
        };
        let records = vec![
            SmartLinkRecord {
                short_id: "one".to_string(),
                ..sample_record()
            },
            broken,
            SmartLinkRecord {
                short_id: "three".to_string(),
                ..sample_record()
            },
        ];
        let h = harness_with(records, &[]);

        let response = send(
            &h.app,
            Request::post("/api/v1/static-pages/regenerate-all")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["generated"], 2);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["errors"][0]["shortId"], "two");
        assert!(body["completedAt"].is_string());

        let listing = body_json(send(&h.app, get("/api/v1/static-pages")).await).await;
        assert_eq!(listing["count"], 2);
        assert_eq!(listing["shortIds"], json!(["one", "three"]));
    }

    #[tokio::test]
    async fn regenerate_all_prune_query() {
        let h = harness_with(vec![sample_record()], &[]);
        h.state
            .store
            .write("stale", "old".to_string())
            .await
            .unwrap();

        let response = send(
            &h.app,
            Request::post("/api/v1/static-pages/regenerate-all?prune=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["pruned"], json!(["stale"]));
        assert!(!h.state.store.exists("stale").await);
        assert!(h.state.store.exists("abc123").await);
    }

    #[tokio::test]
    async fn admin_requires_token_when_configured() {
        let h = harness_with(Vec::new(), &["secret"]);

        let response = send(&h.app, get("/api/v1/static-pages")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::get("/api/v1/static-pages")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&h.app, wrong).await.status(), StatusCode::UNAUTHORIZED);

        let right = Request::get("/api/v1/static-pages")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&h.app, right).await.status(), StatusCode::OK);

        // Public routes stay open.
        assert_eq!(
            send(&h.app, get("/sl/abc123.html")).await.status(),
            StatusCode::OK
        );
    }
}
