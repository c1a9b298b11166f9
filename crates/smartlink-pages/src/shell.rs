//! The single-page application's root document.
//!
//! Requests without a static page get the app's `index.html` so the
//! client-side router can take over (including its own "not found" view).
//! The document is read once per process. Concurrent first callers await
//! the same in-flight read. A failed read is not memoized: that request gets
//! a minimal built-in shell and the next request tries the file again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

/// Served when the app's index cannot be read.
pub const FALLBACK_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>SmartLinks</title>
</head>
<body>
<div id="root"></div>
<noscript><a href="/">Continue to the site</a></noscript>
</body>
</html>
"#;

/// Lazily loaded, process-wide app shell.
#[derive(Debug)]
pub struct AppShell {
    path: PathBuf,
    document: OnceCell<Arc<str>>,
    fallback: Arc<str>,
}

impl AppShell {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: OnceCell::new(),
            fallback: Arc::from(FALLBACK_SHELL),
        }
    }

    /// Path of the app's index document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the real document has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.document.initialized()
    }

    /// The app's root document, or the built-in shell if it cannot be read.
    pub async fn document(&self) -> Arc<str> {
        let loaded = self
            .document
            .get_or_try_init(|| async {
                let html = tokio::fs::read_to_string(&self.path).await?;
                tracing::info!(path = %self.path.display(), bytes = html.len(), "app shell loaded");
                Ok::<_, std::io::Error>(Arc::<str>::from(html))
            })
            .await;

        match loaded {
            Ok(doc) => Arc::clone(doc),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "app shell unavailable, serving built-in shell"
                );
                Arc::clone(&self.fallback)
            }
        }
    }
}
