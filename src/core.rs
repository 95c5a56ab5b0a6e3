//! Core domain types and service traits for Klaxon
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the crate.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned to an alert by the storage collaborator.
pub type AlertId = u64;

/// Category applied to alerts raised without an explicit one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A persisted record of an escalation-worthy event.
///
/// Alerts are immutable after creation: the dispatcher creates them through
/// an [`AlertStore`], and every later stage (rule matching, notification)
/// only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Alert {
    /// Unique identifier, assigned at creation by the store.
    pub id: AlertId,
    /// Stringified error, if the alert was triggered by one.
    pub exception: Option<String>,
    /// Newline-joined error cause chain, if the alert was triggered by one.
    pub backtrace: Option<String>,
    /// Free-form severity. Conventionally one of low, medium, high,
    /// critical, or notification.
    pub severity: String,
    /// Human-readable description. May be empty.
    pub message: String,
    /// Free-form classification tag used by recipient rules.
    pub category: String,
    /// RFC 3339 timestamp of when the alert was raised.
    pub created_at: String,
}

/// The fields of an alert before the store has assigned it an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewAlert {
    pub exception: Option<String>,
    pub backtrace: Option<String>,
    pub severity: String,
    pub message: String,
    pub category: String,
    pub created_at: String,
}

/// Caller-supplied options for raising an alert.
///
/// Unset fields fall back to the defaults documented on [`Alert`]: empty
/// severity and message, `"uncategorized"` category.
#[derive(Debug, Clone, Default)]
pub struct AlertOptions {
    pub severity: Option<String>,
    pub message: Option<String>,
    pub category: Option<String>,
    /// Deliver synchronously on the caller's task instead of enqueueing.
    pub urgent: bool,
}

impl AlertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn urgent(mut self) -> Self {
        self.urgent = true;
        self
    }
}

/// Errors surfaced by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No alert exists under the given id.
    #[error("alert with id={0} not found")]
    NotFound(AlertId),
    /// Any other backend failure.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Error returned when the queue collaborator rejects a delivery job.
#[derive(Debug, Error)]
#[error("failed to enqueue delivery job on queue '{queue}': {reason}")]
pub struct EnqueueError {
    pub queue: String,
    pub reason: String,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Persists and retrieves alert records.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persists a new alert and returns it with its assigned id.
    async fn create(&self, alert: NewAlert) -> Result<Alert, StoreError>;

    /// Fetches an alert by id.
    ///
    /// # Returns
    /// * `Ok(Alert)` if the alert exists
    /// * `Err(StoreError::NotFound)` if it does not
    async fn find(&self, id: AlertId) -> Result<Alert, StoreError>;
}

/// Submits asynchronous delivery jobs.
///
/// Only the alert id crosses this boundary; the job re-fetches the alert
/// when processed, so a queue implementation is free to serialize across
/// process boundaries.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// A descriptive name for the queue (e.g., "high"). Used for logging.
    fn name(&self) -> &str;

    /// Enqueues a delivery job for the given alert.
    async fn enqueue(&self, alert_id: AlertId) -> Result<(), EnqueueError>;
}

/// A delivery channel implementation (email, sms, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers the alert to the given recipients.
    ///
    /// # Returns
    /// * `Ok(())` if the notification was handed to the channel
    /// * `Err` if delivery failed; the dispatch layer decides containment
    async fn notify(&self, recipients: &[String], alert: &Alert) -> Result<()>;
}

/// Sends a composed email. Used only by the email notifier; the actual
/// transport (SMTP, API, ...) is an external collaborator.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()>;
}
