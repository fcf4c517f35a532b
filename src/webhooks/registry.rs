//! Webhook registrations and persistence.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::observability::metrics;
use crate::webhooks::types::{normalize_events, normalize_url, NewWebhook, Webhook, WebhookUpdate};
use crate::webhooks::WebhookError;

/// A thread-safe registry of subscriber webhooks.
///
/// Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct WebhookRegistry {
    inner: Arc<DashMap<Uuid, Webhook>>,
    /// Normalized URL → id. Enforces one registration per URL.
    urls: Arc<DashMap<String, Uuid>>,
    persistence_path: Option<String>,
    save_lock: Arc<Mutex<()>>,
}

impl WebhookRegistry {
    /// Create a new empty registry.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            urls: Arc::new(DashMap::new()),
            persistence_path,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load from file if it exists; later changes are saved back to it.
    pub fn load_from_file(path: &str) -> Result<Self, WebhookError> {
        let registry = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<Uuid, Webhook> = serde_json::from_reader(reader)?;
            for (id, hook) in map {
                registry.urls.insert(hook.url.clone(), id);
                registry.inner.insert(id, hook);
            }
            tracing::info!(count = registry.inner.len(), path, "Loaded webhooks from file");
        }
        metrics::record_webhooks_registered(registry.inner.len());
        Ok(registry)
    }

    /// Save to the persistence file, if one is configured.
    ///
    /// Saves are serialized and written to `<path>.tmp` first, then renamed
    /// over the target, so readers never see a partial file.
    pub fn save_to_file(&self) -> Result<(), WebhookError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let map: HashMap<_, _> = self
            .inner
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        let tmp = format!("{}.tmp", path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &map)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        tracing::debug!(count = map.len(), path = %path, "Saved webhooks to file");
        Ok(())
    }

    fn persist(&self) {
        metrics::record_webhooks_registered(self.inner.len());
        if self.persistence_path.is_none() {
            return;
        }
        let registry = self.clone();
        // Off the async workers when a runtime is available.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || registry.save_logged());
            }
            Err(_) => registry.save_logged(),
        }
    }

    fn save_logged(&self) {
        // The in-memory registry stays authoritative if the write fails.
        if let Err(e) = self.save_to_file() {
            tracing::error!(error = %e, "Failed to persist webhook registry");
        }
    }

    /// Register a new webhook.
    pub fn create(&self, new: NewWebhook) -> Result<Webhook, WebhookError> {
        let url = normalize_url(&new.url)?;
        let events = normalize_events(&new.events)?;
        let id = Uuid::new_v4();

        match self.urls.entry(url.clone()) {
            Entry::Occupied(_) => return Err(WebhookError::Duplicate(url)),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let hook = Webhook {
            id,
            url,
            events,
            secret: new.secret.filter(|s| !s.is_empty()),
            description: new.description,
            is_active: new.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.inner.insert(id, hook.clone());
        tracing::info!(webhook_id = %id, url = %hook.url, events = ?hook.events, "Webhook registered");
        self.persist();
        Ok(hook)
    }

    pub fn get(&self, id: Uuid) -> Result<Webhook, WebhookError> {
        self.inner
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(WebhookError::NotFound(id))
    }

    /// Page of webhooks ordered by creation time, plus the filtered total.
    pub fn list(&self, skip: usize, limit: usize, active: Option<bool>) -> (Vec<Webhook>, usize) {
        let mut all: Vec<Webhook> = self
            .inner
            .iter()
            .filter(|r| active.map_or(true, |a| r.value().is_active == a))
            .map(|r| r.value().clone())
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let total = all.len();
        let page = all.into_iter().skip(skip).take(limit).collect();
        (page, total)
    }

    /// Apply a partial update.
    pub fn update(&self, id: Uuid, update: WebhookUpdate) -> Result<Webhook, WebhookError> {
        let new_url = match &update.url {
            Some(raw) => Some(normalize_url(raw)?),
            None => None,
        };
        let new_events = match &update.events {
            Some(events) => Some(normalize_events(events)?),
            None => None,
        };

        // The entry guard serializes updates and deletes of this webhook
        // while its URL reservation is swapped.
        let updated = {
            let mut entry = self.inner.get_mut(&id).ok_or(WebhookError::NotFound(id))?;
            let hook = entry.value_mut();
            if let Some(url) = new_url.filter(|u| *u != hook.url) {
                match self.urls.entry(url.clone()) {
                    Entry::Occupied(_) => return Err(WebhookError::Duplicate(url)),
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
                self.urls.remove(&hook.url);
                hook.url = url;
            }
            if let Some(events) = new_events {
                hook.events = events;
            }
            if let Some(secret) = update.secret {
                hook.secret = Some(secret).filter(|s| !s.is_empty());
            }
            if let Some(description) = update.description {
                hook.description = Some(description);
            }
            if let Some(active) = update.is_active {
                hook.is_active = active;
            }
            hook.updated_at = Utc::now();
            hook.clone()
        };

        tracing::info!(webhook_id = %id, "Webhook updated");
        self.persist();
        Ok(updated)
    }

    pub fn delete(&self, id: Uuid) -> Result<Webhook, WebhookError> {
        let (_, hook) = self.inner.remove(&id).ok_or(WebhookError::NotFound(id))?;
        self.urls.remove(&hook.url);
        tracing::info!(webhook_id = %id, url = %hook.url, "Webhook deleted");
        self.persist();
        Ok(hook)
    }

    /// Active webhooks subscribed to `event`.
    pub fn subscribers_for(&self, event: &str) -> Vec<Webhook> {
        self.inner
            .iter()
            .filter(|r| r.value().subscribes_to(event))
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}
