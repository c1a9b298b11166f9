//! Filesystem-backed page store.
//!
//! One `{shortId}.html` per SmartLink in a single directory, so pages can be
//! served straight off disk or by a CDN. Writes go to a temporary file in
//! the same directory and are renamed into place; a concurrent reader sees
//! either the previous page or the new one, never a partial file.
//!
//! # Directory Structure
//!
//! ```text
//! dist/sl/
//! ├── abc123.html
//! ├── xyz789.html
//! └── .tmpXXXXXX.tmp     # in-flight write, renamed on completion
//! ```

use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::Config;
use crate::error::{PageError, StorageError, ValidationError};
use crate::record::is_valid_short_id;

const PAGE_EXTENSION: &str = "html";

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPage {
    pub short_id: String,
    /// Public URL of the page.
    pub url: String,
    /// Location on disk.
    pub file_path: String,
}

/// Durable cache of rendered pages keyed by short id.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
    base_url: String,
    io_timeout: Duration,
}

impl PageStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>, io_timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
            io_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output_dir.clone(),
            config.base_url.clone(),
            config.io_timeout,
        )
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the page for `short_id`, rejecting ids that are not plain filenames.
    pub fn path_for(&self, short_id: &str) -> Result<PathBuf, ValidationError> {
        if !is_valid_short_id(short_id) {
            return Err(ValidationError {
                fields: vec!["shortId"],
            });
        }
        Ok(self.dir.join(format!("{short_id}.{PAGE_EXTENSION}")))
    }

    /// Public URL of the page for `short_id`.
    pub fn url_for(&self, short_id: &str) -> String {
        page_url(&self.base_url, short_id)
    }

    /// Write (or overwrite) the page for `short_id`.
    ///
    /// A write that misses the I/O deadline is abandoned before the rename,
    /// so a caller told it timed out does not later find the page replaced.
    pub async fn write(&self, short_id: &str, html: String) -> Result<StoredPage, PageError> {
        let path = self.path_for(short_id)?;
        let dir = self.dir.clone();
        let target = path.clone();
        let timeout = self.io_timeout;
        let deadline = Instant::now() + timeout;

        let task = tokio::task::spawn_blocking(move || {
            write_atomic(&dir, &target, html.as_bytes(), deadline, timeout)
        });

        self.bounded(&path, async {
            task.await
                .map_err(|e| PageError::Internal(e.into()))
                .and_then(|written| written.map_err(PageError::from))
        })
        .await?;

        tracing::info!(short_id = %short_id, path = %path.display(), "static page written");

        Ok(StoredPage {
            short_id: short_id.to_string(),
            url: self.url_for(short_id),
            file_path: path.display().to_string(),
        })
    }

    /// Read the cached page for `short_id`.
    ///
    /// Returns [`PageError::NotFound`] when no page exists.
    pub async fn read(&self, short_id: &str) -> Result<String, PageError> {
        let path = self.path_for(short_id)?;
        self.bounded(&path, async {
            match tokio::fs::read_to_string(&path).await {
                Ok(html) => Ok(html),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(PageError::NotFound(short_id.to_string()))
                }
                Err(e) => Err(StorageError::io(&path, e).into()),
            }
        })
        .await
    }

    /// Delete the page for `short_id`.
    ///
    /// Deleting a page that does not exist succeeds; the return value says
    /// whether a file was actually removed. Ids that can never name a page
    /// are treated the same way.
    pub async fn delete(&self, short_id: &str) -> Result<bool, PageError> {
        let Ok(path) = self.path_for(short_id) else {
            tracing::debug!(short_id = %short_id, "invalid short id, nothing to delete");
            return Ok(false);
        };
        let removed = self
            .bounded(&path, async {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => Ok(true),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(PageError::from(StorageError::io(&path, e))),
                }
            })
            .await?;

        if removed {
            tracing::info!(short_id = %short_id, "static page deleted");
        } else {
            tracing::debug!(short_id = %short_id, "static page already absent");
        }
        Ok(removed)
    }

    /// Whether a page exists for `short_id`. Invalid ids and I/O errors count as absent.
    pub async fn exists(&self, short_id: &str) -> bool {
        let Ok(path) = self.path_for(short_id) else {
            return false;
        };
        let check = self
            .bounded(&path, async {
                tokio::fs::try_exists(&path)
                    .await
                    .map_err(|e| PageError::from(StorageError::io(&path, e)))
            })
            .await;

        match check {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(short_id = %short_id, error = %err, "page presence check failed");
                false
            }
        }
    }

    /// Short ids of every stored page, sorted.
    pub async fn list(&self) -> Result<Vec<String>, PageError> {
        self.bounded(&self.dir, list_page_ids(&self.dir)).await
    }

    /// Run `fut` under the store's I/O timeout.
    async fn bounded<T>(
        &self,
        path: &Path,
        fut: impl Future<Output = Result<T, PageError>>,
    ) -> Result<T, PageError> {
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                path: path.to_path_buf(),
                secs: self.io_timeout.as_secs(),
            }
            .into()),
        }
    }
}

/// Public URL of the page for `short_id` under `base_url`.
///
/// Shared by the renderer (`og:url`, canonical link) and the store's
/// write result so both always agree.
pub fn page_url(base_url: &str, short_id: &str) -> String {
    format!("{base_url}/sl/{short_id}.{PAGE_EXTENSION}")
}

async fn list_page_ids(dir: &Path) -> Result<Vec<String>, PageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e).into()),
    };

    let mut ids = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if is_valid_short_id(stem) {
                ids.push(stem.to_string());
            }
        }
    }
    ids.sort();
    Ok(ids)
}

/// Write `contents` to a temp file in `dir`, flush it, then rename onto `target`.
///
/// The temp file is removed if any step fails, including reaching `deadline`
/// before the rename.
fn write_atomic(
    dir: &Path,
    target: &Path,
    contents: &[u8],
    deadline: Instant,
    timeout: Duration,
) -> Result<(), StorageError> {
    std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StorageError::io(dir, e))?;

    tmp.write_all(contents)
        .map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::io(tmp.path(), e))?;

    // Temp files are created 0600; pages are served by other processes.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| StorageError::io(tmp.path(), e))?;
    }

    if Instant::now() >= deadline {
        return Err(StorageError::Timeout {
            path: target.to_path_buf(),
            secs: timeout.as_secs(),
        });
    }

    tmp.persist(target)
        .map_err(|e| StorageError::io(target, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> PageStore {
        PageStore::new(
            dir.path().join("sl"),
            "https://links.example.com",
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn write_creates_directory_and_file() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let page = store
            .write("abc123", "<html>hi</html>".to_string())
            .await
            .unwrap();

        assert_eq!(page.short_id, "abc123");
        assert_eq!(page.url, "https://links.example.com/sl/abc123.html");
        assert!(page.file_path.ends_with("abc123.html"));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("sl/abc123.html")).unwrap(),
            "<html>hi</html>"
        );
    }

    #[tokio::test]
    async fn write_overwrites_and_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store.write("abc123", "old".to_string()).await.unwrap();
        store.write("abc123", "new".to_string()).await.unwrap();

        assert_eq!(store.read("abc123").await.unwrap(), "new");
        let names: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["abc123.html".to_string()]);
    }

    #[test]
    fn page_url_matches_store_url() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            page_url("https://links.example.com", "abc123"),
            store(&tmp).url_for("abc123")
        );
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = store(&tmp).read("nope").await.unwrap_err();
        assert!(matches!(err, PageError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn exists_tracks_writes_and_deletes() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert!(!store.exists("abc123").await);
        store.write("abc123", "x".to_string()).await.unwrap();
        assert!(store.exists("abc123").await);
        assert!(store.delete("abc123").await.unwrap());
        assert!(!store.exists("abc123").await);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert!(!store.delete("ghost").await.unwrap());
        assert!(!store.delete("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn delete_invalid_id_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        assert!(!store(&tmp).delete("bad.id").await.unwrap());
        assert!(!store(&tmp).delete("../escape").await.unwrap());
    }

    #[test]
    fn write_past_deadline_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("sl");
        let target = dir.join("abc123.html");

        let err = write_atomic(&dir, &target, b"late", Instant::now(), Duration::ZERO).unwrap_err();

        assert!(matches!(err, StorageError::Timeout { .. }));
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let err = store
            .write("../escape", "x".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Validation(_)));
        assert!(!store.exists("../escape").await);
        assert!(!tmp.path().join("escape.html").exists());
    }

    #[tokio::test]
    async fn list_returns_sorted_page_ids_only() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert!(store.list().await.unwrap().is_empty());

        store.write("b2", "x".to_string()).await.unwrap();
        store.write("a1", "x".to_string()).await.unwrap();
        std::fs::write(store.dir().join("notes.txt"), "ignored").unwrap();
        std::fs::write(store.dir().join("bad name.html"), "ignored").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a1", "b2"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn written_pages_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let page = store.write("abc123", "x".to_string()).await.unwrap();

        let mode = std::fs::metadata(page.file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
