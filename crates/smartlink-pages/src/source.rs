//! Read access to SmartLink records.
//!
//! The CRM owns the records; this service only ever lists the published ones
//! for batch regeneration. Two implementations:
//!
//! - [`SqliteSource`]: a read-only connection to a `smartlinks` table
//! - [`MemorySource`]: a fixed list (tests, or no database configured)

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};

use crate::error::PageError;
use crate::record::{PlatformLink, SmartLinkRecord};

/// Table layout expected by [`SqliteSource`].
///
/// `platform_links` holds a JSON array of `{platform, url}` objects.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS smartlinks (
    short_id        TEXT PRIMARY KEY,
    track_title     TEXT,
    artist_name     TEXT,
    cover_image_url TEXT,
    description     TEXT,
    platform_links  TEXT NOT NULL DEFAULT '[]',
    is_published    INTEGER NOT NULL DEFAULT 0,
    artist_slug     TEXT,
    track_slug      TEXT
);
";

const PUBLISHED_QUERY: &str = "
SELECT short_id, track_title, artist_name, cover_image_url, description,
       platform_links, artist_slug, track_slug
FROM smartlinks
WHERE is_published = 1
ORDER BY short_id
";

/// Source of SmartLink records.
#[async_trait]
pub trait SmartLinkSource: Send + Sync {
    /// All records with `isPublished = true`.
    async fn published(&self) -> Result<Vec<SmartLinkRecord>, PageError>;
}

/// Shared handle used by the application state.
pub type SharedSource = Arc<dyn SmartLinkSource>;

/// In-memory list of records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<SmartLinkRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<SmartLinkRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl SmartLinkSource for MemorySource {
    async fn published(&self) -> Result<Vec<SmartLinkRecord>, PageError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.is_published)
            .cloned()
            .collect())
    }
}

/// SmartLink records in a SQLite database.
pub struct SqliteSource {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSource {
    /// Open `path` read-only. The CRM remains the only writer.
    pub fn open(path: &Path) -> Result<Self, PageError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::info!(path = %path.display(), "smartlink database opened (read-only)");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl SmartLinkSource for SqliteSource {
    async fn published(&self) -> Result<Vec<SmartLinkRecord>, PageError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || query_published(&conn.lock()))
            .await
            .map_err(|e| PageError::Internal(e.into()))?
    }
}

fn query_published(conn: &Connection) -> Result<Vec<SmartLinkRecord>, PageError> {
    let mut stmt = conn.prepare(PUBLISHED_QUERY)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (short_id, track_title, artist_name, cover, description, links, artist_slug, track_slug) =
            row?;
        let short_id = short_id.unwrap_or_default();
        let platform_links = parse_platform_links(&short_id, links.as_deref());

        // NULLs become empty strings so the renderer reports the missing field.
        records.push(SmartLinkRecord {
            short_id,
            track_title: track_title.unwrap_or_default(),
            artist_name: artist_name.unwrap_or_default(),
            cover_image_url: cover.unwrap_or_default(),
            description,
            platform_links,
            is_published: true,
            artist_slug,
            track_slug,
        });
    }

    tracing::debug!(count = records.len(), "loaded published smartlinks");
    Ok(records)
}

fn parse_platform_links(short_id: &str, raw: Option<&str>) -> Vec<PlatformLink> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str(raw) {
        Ok(links) => links,
        Err(e) => {
            tracing::warn!(short_id = %short_id, error = %e, "unparseable platform_links, ignoring");
            Vec::new()
        }
    }
}
