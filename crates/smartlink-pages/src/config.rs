//! Application configuration loaded from environment variables.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8082").
    pub bind_addr: String,

    /// Public origin of this service, used for page URLs and `og:url`.
    pub base_url: String,

    /// Site name shown in `og:site_name`.
    pub site_name: String,

    /// Directory holding one `{shortId}.html` per SmartLink.
    pub output_dir: PathBuf,

    /// Root document of the single-page application.
    pub app_index: PathBuf,

    /// SQLite database with the `smartlinks` table (optional).
    pub db_path: Option<PathBuf>,

    /// Bearer tokens accepted by the admin API. Empty leaves it open.
    pub api_tokens: Arc<HashSet<String>>,

    /// Delay before the client-side redirect fires.
    pub redirect_delay_ms: u64,

    /// Records rendered in parallel by regenerate-all.
    pub regen_concurrency: usize,

    /// Upper bound on any single filesystem operation.
    pub io_timeout: Duration,

    /// Delete pages of unpublished SmartLinks during regenerate-all.
    pub prune_orphans: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `SMARTLINK_BIND_ADDR`: Server bind address (default: "0.0.0.0:8082")
    /// - `SMARTLINK_BASE_URL`: Public origin (default: "http://localhost:8082")
    /// - `SMARTLINK_SITE_NAME`: Site name (default: "SmartLinks")
    /// - `SMARTLINK_OUTPUT_DIR`: Page directory (default: "dist/sl")
    /// - `SMARTLINK_APP_INDEX`: SPA root document (default: "dist/index.html")
    /// - `SMARTLINK_DB_PATH`: SQLite database of SmartLink records
    /// - `SMARTLINK_API_TOKENS`: Comma-separated admin API tokens
    /// - `SMARTLINK_REDIRECT_DELAY_MS`: Redirect delay (default: 1000)
    /// - `SMARTLINK_REGEN_CONCURRENCY`: Batch parallelism (default: 4)
    /// - `SMARTLINK_IO_TIMEOUT_SECS`: Filesystem timeout (default: 10)
    /// - `SMARTLINK_PRUNE_ORPHANS`: Prune orphan pages (default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("SMARTLINK_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8082".to_string());

        let base_url = std::env::var("SMARTLINK_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8082".to_string())
            .trim_end_matches('/')
            .to_string();

        let site_name =
            std::env::var("SMARTLINK_SITE_NAME").unwrap_or_else(|_| "SmartLinks".to_string());

        let output_dir = std::env::var("SMARTLINK_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dist/sl"));

        let app_index = std::env::var("SMARTLINK_APP_INDEX")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dist/index.html"));

        let db_path = std::env::var("SMARTLINK_DB_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let api_tokens: HashSet<String> = std::env::var("SMARTLINK_API_TOKENS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let redirect_delay_ms = parse_var("SMARTLINK_REDIRECT_DELAY_MS", 1000u64)?;
        let regen_concurrency = parse_var("SMARTLINK_REGEN_CONCURRENCY", 4usize)?.max(1);
        let io_timeout = Duration::from_secs(parse_var("SMARTLINK_IO_TIMEOUT_SECS", 10u64)?);
        let prune_orphans = parse_var("SMARTLINK_PRUNE_ORPHANS", false)?;

        tracing::info!(
            bind_addr = %bind_addr,
            base_url = %base_url,
            site_name = %site_name,
            output_dir = %output_dir.display(),
            app_index = %app_index.display(),
            db_path = ?db_path,
            token_count = api_tokens.len(),
            regen_concurrency,
            prune_orphans,
            "smartlink configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_url,
            site_name,
            output_dir,
            app_index,
            db_path,
            api_tokens: Arc::new(api_tokens),
            redirect_delay_ms,
            regen_concurrency,
            io_timeout,
            prune_orphans,
        })
    }

    /// Defaults pointing the page store at `output_dir`.
    #[cfg(test)]
    pub(crate) fn for_tests(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            base_url: "http://localhost:8082".to_string(),
            site_name: "SmartLinks".to_string(),
            app_index: output_dir.join("index.html"),
            output_dir,
            db_path: None,
            api_tokens: Arc::new(HashSet::new()),
            redirect_delay_ms: 1000,
            regen_concurrency: 2,
            io_timeout: Duration::from_secs(5),
            prune_orphans: false,
        }
    }
}

/// Parse an optional variable, failing loudly on malformed values.
fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}
