//! In-memory reference implementation of the alert store.
//!
//! Persistent storage is an external collaborator; this implementation
//! exists for in-process use and tests.

use crate::core::{Alert, AlertId, AlertStore, NewAlert, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// An [`AlertStore`] holding alerts in a process-local map, with ids
/// assigned from a monotonically increasing counter.
pub struct MemoryStore {
    next_id: AtomicU64,
    alerts: Mutex<HashMap<AlertId, Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            alerts: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn create(&self, new: NewAlert) -> Result<Alert, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let alert = Alert {
            id,
            exception: new.exception,
            backtrace: new.backtrace,
            severity: new.severity,
            message: new.message,
            category: new.category,
            created_at: new.created_at,
        };
        self.alerts.lock().unwrap().insert(id, alert.clone());
        Ok(alert)
    }

    async fn find(&self, id: AlertId) -> Result<Alert, StoreError> {
        self.alerts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
