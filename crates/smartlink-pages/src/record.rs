//! SmartLink records as read from the CRM database.
//!
//! Records are owned by the external database; this service only reads
//! them, validates the fields it needs for rendering, and derives slugs.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Maximum length of a short id (it becomes a filename).
pub const MAX_SHORT_ID_LEN: usize = 64;

/// A streaming-platform link attached to a SmartLink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLink {
    /// Display name, e.g. "Spotify".
    pub platform: String,
    /// Absolute URL on that platform.
    pub url: String,
}

/// A SmartLink as stored in the CRM.
///
/// Text fields default to empty rather than failing deserialization, so
/// that incomplete records surface as a [`ValidationError`] naming the
/// missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartLinkRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub short_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub track_title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artist_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cover_image_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "platforms")]
    pub platform_links: Vec<PlatformLink>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub artist_slug: Option<String>,
    #[serde(default)]
    pub track_slug: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SmartLinkRecord {
    /// Check the fields the renderer depends on.
    ///
    /// Reports every offending field at once rather than the first one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();

        if !is_valid_short_id(&self.short_id) {
            fields.push("shortId");
        }
        if self.track_title.trim().is_empty() {
            fields.push("trackTitle");
        }
        if self.artist_name.trim().is_empty() {
            fields.push("artistName");
        }
        if self.cover_image_url.trim().is_empty() {
            fields.push("coverImageUrl");
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }

    /// Description for meta tags, falling back to a generated sentence.
    pub fn description_or_default(&self) -> Cow<'_, str> {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => Cow::Borrowed(d),
            _ => Cow::Owned(format!(
                "Listen to {} by {} on your favorite streaming platform.",
                self.track_title.trim(),
                self.artist_name.trim()
            )),
        }
    }

    /// Artist slug, using the stored one when present.
    pub fn artist_slug(&self) -> String {
        slug_or_derive(self.artist_slug.as_deref(), &self.artist_name)
    }

    /// Track slug, using the stored one when present.
    pub fn track_slug(&self) -> String {
        slug_or_derive(self.track_slug.as_deref(), &self.track_title)
    }

    /// Hash route of this SmartLink inside the single-page application.
    pub fn app_route(&self) -> String {
        format!(
            "/#/smartlinks/{}/{}",
            self.artist_slug(),
            self.track_slug()
        )
    }
}

fn slug_or_derive(stored: Option<&str>, source: &str) -> String {
    // Stored slugs are re-slugged; they end up inside a script literal.
    let slug = stored.map(slugify).unwrap_or_default();
    if slug.is_empty() { slugify(source) } else { slug }
}

/// Lowercase `s` and collapse every run of non-alphanumerics into `-`.
///
/// ```
/// use smartlink_pages::record::slugify;
/// assert_eq!(slugify("Jane Doe"), "jane-doe");
/// assert_eq!(slugify("  AC/DC -- Live! "), "ac-dc-live");
/// ```
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

/// Whether `id` is usable as a page-store key: `[A-Za-z0-9_-]{1,64}`.
pub fn is_valid_short_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SHORT_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// The record used across unit tests.
#[cfg(test)]
pub(crate) fn sample_record() -> SmartLinkRecord {
    SmartLinkRecord {
        short_id: "abc123".to_string(),
        track_title: "Midnight".to_string(),
        artist_name: "Jane Doe".to_string(),
        cover_image_url: "https://cdn.example.com/cover.jpg".to_string(),
        platform_links: vec![PlatformLink {
            platform: "Spotify".to_string(),
            url: "https://open.spotify.com/x".to_string(),
        }],
        is_published: true,
        ..Default::default()
    }
}
