//! SmartLink Pages - HTTP server for static SmartLink pages.
//!
//! Serves pre-rendered SmartLink pages with Open Graph tags and the admin API
//! the CRM uses to keep them in sync. With `--regenerate` it rebuilds every
//! published page once and exits.

use axum::http::Request;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use smartlink_pages::{AppState, Config, regen, router};

/// SmartLink Pages - static pages for SmartLinks.
#[derive(Parser, Debug)]
#[command(name = "smartlink-pages")]
#[command(about = "Static page generator and server for SmartLinks", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,

    /// Regenerate every published page, print the summary and exit.
    #[arg(long)]
    regenerate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let state = AppState::new(config)?;

    if args.regenerate {
        let summary = regen::regenerate_all(
            state.source.as_ref(),
            &state.store,
            &state.config,
            state.config.prune_orphans,
        )
        .await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let app = router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting smartlink page server");

    axum::serve(listener, app).await?;

    Ok(())
}
