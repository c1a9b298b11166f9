//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::error::PageError;
use crate::shell::AppShell;
use crate::source::{MemorySource, SharedSource, SqliteSource};
use crate::store::PageStore;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Rendered pages on disk.
    pub store: PageStore,

    /// Published SmartLink records.
    pub source: SharedSource,

    /// SPA root document served when no static page exists.
    pub shell: Arc<AppShell>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Without `SMARTLINK_DB_PATH` the source is empty: single-page
    /// generation still works, regenerate-all has nothing to do.
    pub fn new(config: Config) -> Result<Self, PageError> {
        let source: SharedSource = match &config.db_path {
            Some(path) => Arc::new(SqliteSource::open(path)?),
            None => {
                tracing::warn!("no smartlink database configured, regenerate-all will be a no-op");
                Arc::new(MemorySource::default())
            }
        };

        Ok(Self::with_source(config, source))
    }

    /// Create application state around an explicit record source.
    pub fn with_source(config: Config, source: SharedSource) -> Self {
        let store = PageStore::from_config(&config);
        let shell = Arc::new(AppShell::new(config.app_index.clone()));

        tracing::info!(
            output_dir = %store.dir().display(),
            app_index = %shell.path().display(),
            "application state initialized"
        );

        Self {
            config: Arc::new(config),
            store,
            source,
            shell,
        }
    }
}
