//! In-memory fakes for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use redeliver_common::error::{AppError, AppResult};
use redeliver_common::types::{DeliveryAttempt, DeliveryStatus, Page, Webhook};

use crate::checkpoint::{CheckpointStore, StoredCheckpoint};
use crate::source::HookApi;

pub fn attempt_at(id: u64, guid: &str, delivered_at: DateTime<Utc>, status: &str) -> DeliveryAttempt {
    DeliveryAttempt {
        id,
        guid: guid.to_string(),
        delivered_at,
        status: DeliveryStatus::from(status),
        status_code: None,
        redelivery: false,
        duration: None,
        event: Some("push".to_string()),
        action: None,
    }
}

pub fn attempt(id: u64, guid: &str, status: &str) -> DeliveryAttempt {
    let at = Utc.timestamp_opt(1_714_557_600, 0).unwrap();
    attempt_at(id, guid, at, status)
}

struct Feed {
    deliveries: Vec<DeliveryAttempt>,
    page_size: usize,
}

/// Webhooks with fixed, newest-first delivery feeds.
#[derive(Default)]
pub struct FakeHookApi {
    hooks: Vec<Webhook>,
    feeds: HashMap<u64, Feed>,
    failing_redelivery: Option<u64>,
    failing_feed: Option<u64>,
    calls: Mutex<u32>,
    page_requests: Mutex<HashMap<u64, u32>>,
    redeliveries: Mutex<Vec<(u64, u64)>>,
}

impl FakeHookApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, hook_id: u64, deliveries: Vec<DeliveryAttempt>, page_size: usize) -> Self {
        if !self.hooks.iter().any(|h| h.id == hook_id) {
            self.hooks.push(Webhook {
                id: hook_id,
                name: Some("web".to_string()),
                active: true,
                events: vec!["push".to_string()],
            });
        }
        self.feeds.insert(
            hook_id,
            Feed {
                deliveries,
                page_size,
            },
        );
        self
    }

    pub fn failing_redelivery(mut self, delivery_id: u64) -> Self {
        self.failing_redelivery = Some(delivery_id);
        self
    }

    pub fn failing_feed(mut self, hook_id: u64) -> Self {
        self.failing_feed = Some(hook_id);
        self
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    pub fn page_requests(&self, hook_id: u64) -> u32 {
        self.page_requests
            .lock()
            .unwrap()
            .get(&hook_id)
            .copied()
            .unwrap_or(0)
    }

    /// Successful redelivery requests as `(hook_id, delivery_id)`.
    pub fn redeliveries(&self) -> Vec<(u64, u64)> {
        self.redeliveries.lock().unwrap().clone()
    }

    fn record_call(&self) {
        *self.calls.lock().unwrap() += 1;
    }
}

#[async_trait]
impl HookApi for FakeHookApi {
    async fn list_webhooks(&self) -> AppResult<Vec<Webhook>> {
        self.record_call();
        Ok(self.hooks.clone())
    }

    async fn get_webhook(&self, hook_id: u64) -> AppResult<Webhook> {
        self.record_call();
        self.hooks
            .iter()
            .find(|h| h.id == hook_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("hook {}", hook_id)))
    }

    async fn deliveries_page(
        &self,
        hook_id: u64,
        cursor: Option<&str>,
    ) -> AppResult<Page<DeliveryAttempt>> {
        self.record_call();
        *self.page_requests.lock().unwrap().entry(hook_id).or_insert(0) += 1;

        if self.failing_feed == Some(hook_id) {
            return Err(AppError::Api {
                status: 500,
                message: "Server Error".to_string(),
            });
        }

        let feed = self
            .feeds
            .get(&hook_id)
            .ok_or_else(|| AppError::NotFound(format!("hook {}", hook_id)))?;
        let index: usize = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| AppError::Internal(format!("bad cursor {}", c)))?,
            None => 0,
        };

        let start = (index * feed.page_size).min(feed.deliveries.len());
        let end = (start + feed.page_size).min(feed.deliveries.len());
        let next = (end < feed.deliveries.len()).then(|| (index + 1).to_string());

        Ok(Page {
            items: feed.deliveries[start..end].to_vec(),
            next,
        })
    }

    async fn redeliver(&self, hook_id: u64, delivery_id: u64) -> AppResult<()> {
        self.record_call();
        if self.failing_redelivery == Some(delivery_id) {
            return Err(AppError::Api {
                status: 422,
                message: "Validation Failed".to_string(),
            });
        }
        self.redeliveries.lock().unwrap().push((hook_id, delivery_id));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

/// Single-value checkpoint store with create/update semantics.
pub struct MemoryCheckpointStore {
    value: Mutex<Option<String>>,
    failing: bool,
    writes: Mutex<Vec<(WriteKind, String)>>,
}

impl MemoryCheckpointStore {
    pub fn absent() -> Self {
        Self {
            value: Mutex::new(None),
            failing: false,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn found(value: &str) -> Self {
        let store = Self::absent();
        *store.value.lock().unwrap() = Some(value.to_string());
        store
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::absent()
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(WriteKind, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn read(&self, _name: &str) -> AppResult<StoredCheckpoint> {
        if self.failing {
            return Err(AppError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(match self.value() {
            Some(value) => StoredCheckpoint::Found(value),
            None => StoredCheckpoint::Absent,
        })
    }

    async fn write(&self, name: &str, value: &str, previous: &StoredCheckpoint) -> AppResult<()> {
        let mut current = self.value.lock().unwrap();
        let kind = match (previous, current.is_some()) {
            (StoredCheckpoint::Absent, false) => WriteKind::Create,
            (StoredCheckpoint::Found(_), true) => WriteKind::Update,
            (StoredCheckpoint::Absent, true) => {
                return Err(AppError::Checkpoint(format!("{} already exists", name)));
            }
            (StoredCheckpoint::Found(_), false) => {
                return Err(AppError::Checkpoint(format!("{} does not exist", name)));
            }
        };
        *current = Some(value.to_string());
        self.writes.lock().unwrap().push((kind, value.to_string()));
        Ok(())
    }
}
