//! Bounded per-webhook delivery history.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::webhooks::types::WebhookDelivery;

/// Keeps the most recent deliveries for each webhook, newest first.
#[derive(Clone)]
pub struct DeliveryLog {
    inner: Arc<DashMap<Uuid, VecDeque<WebhookDelivery>>>,
    capacity: usize,
}

impl DeliveryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, delivery: WebhookDelivery) {
        let mut entries = self.inner.entry(delivery.webhook_id).or_default();
        entries.push_front(delivery);
        entries.truncate(self.capacity);
    }

    /// Page of deliveries for one webhook, plus the number retained.
    pub fn list(&self, webhook_id: Uuid, skip: usize, limit: usize) -> (Vec<WebhookDelivery>, usize) {
        match self.inner.get(&webhook_id) {
            Some(entries) => (
                entries.iter().skip(skip).take(limit).cloned().collect(),
                entries.len(),
            ),
            None => (Vec::new(), 0),
        }
    }

    /// Drop the history of a deleted webhook.
    pub fn remove(&self, webhook_id: Uuid) {
        self.inner.remove(&webhook_id);
    }
}
