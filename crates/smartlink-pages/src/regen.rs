//! Page generation: single records and the regenerate-all batch job.
//!
//! The batch job is not transactional. Each record is rendered and written
//! on its own; a failure is recorded against its short id and the rest of
//! the batch carries on. A cancelled run leaves whatever it already wrote.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::config::Config;
use crate::error::PageError;
use crate::record::SmartLinkRecord;
use crate::render::render_page;
use crate::source::SmartLinkSource;
use crate::store::{PageStore, StoredPage};

/// A record that could not be regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub short_id: String,
    pub error: String,
}

/// Outcome of a regenerate-all run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationSummary {
    /// Published records seen.
    pub total: usize,
    pub generated: usize,
    pub failed: usize,
    /// One entry per failed record, in source order, followed by any prune failures.
    pub errors: Vec<ItemError>,
    /// Orphan pages removed (only when pruning).
    pub pruned: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Render `record` and write it to the store.
///
/// Nothing is written if the record fails validation.
pub async fn generate_one(
    record: &SmartLinkRecord,
    config: &Config,
    store: &PageStore,
) -> Result<StoredPage, PageError> {
    let html = render_page(record, config)?.into_string();
    store.write(&record.short_id, html).await
}

/// Rebuild the page of every published SmartLink.
///
/// With `prune` set, pages whose short id is not among the published records
/// are deleted afterwards. Only a failure to list the source aborts the run.
pub async fn regenerate_all(
    source: &dyn SmartLinkSource,
    store: &PageStore,
    config: &Config,
    prune: bool,
) -> Result<RegenerationSummary, PageError> {
    let records = source.published().await?;
    let total = records.len();

    tracing::info!(
        total,
        concurrency = config.regen_concurrency,
        prune,
        "regenerating static pages"
    );

    let results: Vec<(String, Result<StoredPage, PageError>)> =
        stream::iter(records.iter().cloned())
            .map(|record| async move {
                let result = generate_one(&record, config, store).await;
                (record.short_id, result)
            })
            .buffered(config.regen_concurrency.max(1))
            .collect()
            .await;

    let mut generated = 0;
    let mut errors = Vec::new();
    for (short_id, result) in results {
        match result {
            Ok(_) => generated += 1,
            Err(err) => {
                tracing::warn!(short_id = %short_id, error = %err, "page regeneration failed");
                errors.push(ItemError {
                    short_id,
                    error: err.to_string(),
                });
            }
        }
    }
    let failed = errors.len();

    let pruned = if prune {
        let published: HashSet<&str> = records.iter().map(|r| r.short_id.as_str()).collect();
        prune_orphans(store, &published, &mut errors).await
    } else {
        Vec::new()
    };

    tracing::info!(
        total,
        generated,
        failed,
        pruned = pruned.len(),
        "static page regeneration complete"
    );

    Ok(RegenerationSummary {
        total,
        generated,
        failed,
        errors,
        pruned,
        completed_at: Utc::now(),
    })
}

/// Delete stored pages not in `published`, returning the removed ids.
async fn prune_orphans(
    store: &PageStore,
    published: &HashSet<&str>,
    errors: &mut Vec<ItemError>,
) -> Vec<String> {
    let stored = match store.list().await {
        Ok(ids) => ids,
        Err(err) => {
            tracing::warn!(error = %err, "could not list page store, skipping prune");
            return Vec::new();
        }
    };

    let mut pruned = Vec::new();
    for short_id in stored {
        if published.contains(short_id.as_str()) {
            continue;
        }
        match store.delete(&short_id).await {
            Ok(_) => pruned.push(short_id),
            Err(err) => {
                tracing::warn!(short_id = %short_id, error = %err, "orphan page delete failed");
                errors.push(ItemError {
                    short_id,
                    error: format!("prune: {err}"),
                });
            }
        }
    }
    pruned
}
