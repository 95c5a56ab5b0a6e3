//! The alert dispatcher: entry points for raising alerts and the
//! asynchronous delivery job body.
//!
//! A failure in the alerting subsystem must never become a failure in the
//! monitored system, so every path here except `watch_strict` favors
//! logging and containment over propagation.

use crate::config::SharedConfig;
use crate::core::{
    Alert, AlertId, AlertOptions, AlertStore, EnqueueError, JobQueue, NewAlert, StoreError,
    UNCATEGORIZED,
};
use crate::notifiers::NotifierRegistry;
use crate::rules::RuleMatcher;
use anyhow::Result;
use chrono::Utc;
use itertools::Itertools;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Orchestrates alert creation, persistence, and delivery.
pub struct Dispatcher {
    store: Arc<dyn AlertStore>,
    queue: Arc<dyn JobQueue>,
    registry: Arc<NotifierRegistry>,
    config: Arc<SharedConfig>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn AlertStore>,
        queue: Arc<dyn JobQueue>,
        registry: Arc<NotifierRegistry>,
        config: Arc<SharedConfig>,
    ) -> Self {
        Self {
            store,
            queue,
            registry,
            config,
        }
    }

    /// Raises an alert and escalates it as configured.
    ///
    /// The alert is persisted first; delivery is then either performed
    /// synchronously (`options.urgent`) or enqueued as a deferred job
    /// carrying only the alert id. If enqueueing itself fails, a critical
    /// meta-alert and the original alert are both delivered synchronously
    /// as a last resort, and no error reaches the caller.
    ///
    /// # Arguments
    /// * `error` - the error that triggered the alert, if one was caught
    /// * `options` - severity, message, category, and delivery mode
    ///
    /// # Returns
    /// The created alert. Only persistence failures are propagated.
    pub async fn raise_alert(
        &self,
        error: Option<&anyhow::Error>,
        options: AlertOptions,
    ) -> Result<Alert> {
        let urgent = options.urgent;
        let alert = self
            .store
            .create(NewAlert {
                exception: error.map(|e| e.to_string()),
                backtrace: error.map(error_chain),
                severity: options.severity.unwrap_or_default(),
                message: options.message.unwrap_or_default(),
                category: options
                    .category
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                created_at: Utc::now().to_rfc3339(),
            })
            .await?;
        metrics::counter!("alerts_raised", "severity" => alert.severity.clone()).increment(1);

        if urgent {
            if let Err(e) = self.deliver(&alert).await {
                error!(alert_id = alert.id, error = %e, "urgent delivery failed");
            }
            return Ok(alert);
        }

        if let Err(e) = self.queue.enqueue(alert.id).await {
            metrics::counter!("delivery_enqueue_failures").increment(1);
            warn!(
                alert_id = alert.id,
                queue = self.queue.name(),
                error = %e,
                "enqueue failed, falling back to synchronous delivery"
            );
            self.deliver_enqueue_fallback(&alert, &e).await;
        }

        Ok(alert)
    }

    /// Raises a non-exception alert with severity `"notification"` unless
    /// the options carry one already.
    pub async fn notify(&self, mut options: AlertOptions) -> Result<Alert> {
        if options.severity.is_none() {
            options.severity = Some("notification".to_string());
        }
        self.raise_alert(None, options).await
    }

    /// Raises a non-exception alert with no severity injected.
    pub async fn warn(&self, options: AlertOptions) -> Result<Alert> {
        self.raise_alert(None, options).await
    }

    /// Runs the future and raises an alert if it fails, swallowing the
    /// error: the caller gets `None` instead of the failure.
    pub async fn watch<T, F>(&self, options: AlertOptions, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        match fut.await {
            Ok(value) => Some(value),
            Err(e) => {
                if let Err(raise_err) = self.raise_alert(Some(&e), options).await {
                    error!(error = %raise_err, "failed to raise alert for watched error");
                }
                None
            }
        }
    }

    /// Same as [`watch`](Self::watch), but returns the original error after
    /// alerting. Notification is a side effect, not a substitute for normal
    /// error propagation.
    pub async fn watch_strict<T, F>(&self, options: AlertOptions, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match fut.await {
            Ok(value) => Ok(value),
            Err(e) => {
                if let Err(raise_err) = self.raise_alert(Some(&e), options).await {
                    error!(error = %raise_err, "failed to raise alert for watched error");
                }
                Err(e)
            }
        }
    }

    /// Body of the asynchronous delivery job.
    ///
    /// The alert is always re-fetched by id, never passed by value, so the
    /// queue may serialize jobs across process boundaries. A missing alert
    /// is terminal: it is logged and the job returns cleanly, avoiding
    /// recursive alerting when the alerting subsystem itself is broken.
    #[instrument(skip(self))]
    pub async fn perform_delivery(&self, alert_id: AlertId) -> Result<()> {
        let alert = match self.store.find(alert_id).await {
            Ok(alert) => alert,
            Err(StoreError::NotFound(_)) => {
                error!(alert_id, "raised alert but couldn't find that alert in the store");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.deliver(&alert).await
    }

    /// Resolves recipients for the alert and invokes each notifier.
    ///
    /// An unregistered notifier key is terminal for the whole alert: it is
    /// logged and the remaining pairs are skipped without raising.
    /// Transport errors propagate to the caller, which decides containment.
    pub async fn deliver(&self, alert: &Alert) -> Result<()> {
        let config = self.config.snapshot();
        let rules = config.rules.as_deref().unwrap_or(&[]);
        let resolved = RuleMatcher::new(rules).resolve(alert);

        if resolved.is_empty() {
            debug!(alert_id = alert.id, "no recipient rules matched");
            return Ok(());
        }

        for (notifier_key, recipients) in &resolved {
            let Some(notifier) = self.registry.get(notifier_key) else {
                error!(
                    alert_id = alert.id,
                    notifier = %notifier_key,
                    "no notifier registered under this key; skipping remaining deliveries"
                );
                return Ok(());
            };

            notifier.notify(recipients, alert).await?;
            metrics::counter!("notifications_sent", "notifier" => notifier_key.clone())
                .increment(1);
            info!(
                alert_id = alert.id,
                notifier = %notifier_key,
                recipients = ?recipients,
                "notification sent"
            );
        }

        Ok(())
    }

    /// Last-resort path when the queue rejects a job: synchronously deliver
    /// a critical meta-alert describing the failure, then the original
    /// alert. Failures here are logged, never raised; this path already
    /// represents a degraded state.
    async fn deliver_enqueue_fallback(&self, alert: &Alert, cause: &EnqueueError) {
        let meta = NewAlert {
            exception: None,
            backtrace: None,
            severity: "critical".to_string(),
            message: format!("failed to enqueue delivery of alert {}: {}", alert.id, cause),
            category: "system".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        match self.store.create(meta).await {
            Ok(meta_alert) => {
                if let Err(e) = self.deliver(&meta_alert).await {
                    error!(alert_id = meta_alert.id, error = %e, "failed to deliver enqueue-failure alert");
                }
            }
            Err(e) => {
                error!(error = %e, "failed to persist enqueue-failure alert");
            }
        }

        if let Err(e) = self.deliver(alert).await {
            error!(alert_id = alert.id, error = %e, "fallback delivery of original alert failed");
        }
    }
}

/// Joins the error's cause chain into one newline-separated string.
fn error_chain(error: &anyhow::Error) -> String {
    error.chain().map(|cause| cause.to_string()).join("\n")
}
