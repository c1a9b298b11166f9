//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    /// Whether the app's root document has been read yet.
    app_shell_loaded: bool,
    /// Whether the page directory has been created.
    output_dir_present: bool,
}

/// Public health check endpoint.
///
/// Always `ok` while the process serves requests: a missing page directory
/// or app shell only degrades pages to the fallback shell.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let output_dir_present = tokio::fs::try_exists(state.store.dir())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok",
        service: "smartlink-pages",
        version: env!("CARGO_PKG_VERSION"),
        app_shell_loaded: state.shell.is_loaded(),
        output_dir_present,
    })
}
