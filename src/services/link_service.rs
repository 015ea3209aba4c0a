//! Link shortening service
//!
//! Owns the dedup rule end to end: validate, look up an existing live
//! mapping, otherwise generate and save, then re-read so that a concurrent
//! winner's id is the one returned.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::deletion::{DeleteIntent, DeletionQueue};
use crate::errors::{Result, ShortenerError};
use crate::storage::{LinkLookup, Storage, UserUrl};
use crate::utils::{generate_short_id, normalize_url};

// ============ Request/Response DTOs ============

/// Result of shortening a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenOutcome {
    pub short_id: String,
    /// `false` when an existing live mapping was returned
    pub created: bool,
}

/// One element of a batch request, keyed by a caller-chosen correlation id
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

impl BatchItem {
    pub fn new<C: Into<String>, U: Into<String>>(correlation_id: C, original_url: U) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            original_url: original_url.into(),
        }
    }
}

/// One element of a batch response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_id: String,
}

// ============ ShortenerService Implementation ============

pub struct ShortenerService {
    storage: Arc<dyn Storage>,
    deletions: Option<DeletionQueue>,
}

impl ShortenerService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            deletions: None,
        }
    }

    /// Attach the deletion queue used by [`request_delete`](Self::request_delete)
    pub fn with_deletion_queue(mut self, queue: DeletionQueue) -> Self {
        self.deletions = Some(queue);
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Shorten one URL for `owner_id`
    pub async fn shorten(&self, raw_url: &str, owner_id: &str) -> Result<ShortenOutcome> {
        let url = normalize_url(raw_url)?;

        if let Some(short_id) = self.storage.find_by_original(&url).await? {
            debug!("{} already shortened as {}", url, short_id);
            return Ok(ShortenOutcome {
                short_id,
                created: false,
            });
        }

        let candidate = generate_short_id()?;
        self.storage.save(&candidate, &url, owner_id).await?;

        // A concurrent save of the same URL may have won
        let short_id = match self.storage.find_by_original(&url).await? {
            Some(short_id) => short_id,
            // Ours, already deleted again; or the winner we deduped against is gone
            None => match self.storage.get(&candidate).await? {
                LinkLookup::Live(stored) | LinkLookup::Deleted(stored) if stored == url => {
                    candidate.clone()
                }
                _ => {
                    warn!("{} was not stored as {} and has no live mapping", url, candidate);
                    return Err(ShortenerError::database_operation(format!(
                        "mapping for {} changed concurrently, retry the request",
                        url
                    )));
                }
            },
        };
        let created = short_id == candidate;
        if created {
            info!("Shortened {} as {} for {}", url, short_id, owner_id);
        }

        Ok(ShortenOutcome { short_id, created })
    }

    /// Shorten many URLs in one storage round trip
    ///
    /// Every URL is validated before anything is written. Results keep the
    /// request order; repeated URLs resolve to the same short id.
    pub async fn shorten_batch(
        &self,
        items: &[BatchItem],
        owner_id: &str,
    ) -> Result<Vec<BatchResult>> {
        let mut urls = Vec::with_capacity(items.len());
        for item in items {
            let url = normalize_url(&item.original_url).map_err(|e| {
                ShortenerError::validation(format!(
                    "item '{}': {}",
                    item.correlation_id,
                    e.message()
                ))
            })?;
            urls.push(url);
        }

        let mut resolved: HashMap<String, String> = HashMap::new();
        let mut pairs = Vec::new();
        for url in &urls {
            if resolved.contains_key(url) {
                continue;
            }
            match self.storage.find_by_original(url).await? {
                Some(existing) => {
                    resolved.insert(url.clone(), existing);
                }
                None => {
                    let short_id = generate_short_id()?;
                    resolved.insert(url.clone(), short_id.clone());
                    pairs.push((short_id, url.clone()));
                }
            }
        }

        self.storage.save_batch(&pairs, owner_id).await?;

        for (_, url) in &pairs {
            if let Some(winner) = self.storage.find_by_original(url).await? {
                resolved.insert(url.clone(), winner);
            }
        }
        info!(
            "Batch of {} URL(s) for {}: {} new mapping(s)",
            items.len(),
            owner_id,
            pairs.len()
        );

        items
            .iter()
            .zip(&urls)
            .map(|(item, url)| {
                let short_id = resolved.get(url).cloned().ok_or_else(|| {
                    ShortenerError::database_operation(format!("lost mapping for {}", url))
                })?;
                Ok(BatchResult {
                    correlation_id: item.correlation_id.clone(),
                    short_id,
                })
            })
            .collect()
    }

    pub async fn resolve(&self, short_id: &str) -> Result<LinkLookup> {
        self.storage.get(short_id).await
    }

    pub async fn user_urls(&self, owner_id: &str) -> Result<Vec<UserUrl>> {
        self.storage.get_user_urls(owner_id).await
    }

    /// Queue a soft delete; returns once the request is accepted, not applied
    pub async fn request_delete(&self, owner_id: &str, short_ids: Vec<String>) -> Result<()> {
        let queue = self
            .deletions
            .as_ref()
            .ok_or_else(|| ShortenerError::queue_closed("no deletion queue attached"))?;
        queue.submit(DeleteIntent::new(owner_id, short_ids)).await
    }
}
