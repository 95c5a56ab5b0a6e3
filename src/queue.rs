//! In-process job queue and the delivery worker that drains it.
//!
//! The queue carries only alert ids; the worker re-fetches each alert
//! through the dispatcher when the job runs.

use crate::core::{AlertId, EnqueueError, JobQueue};
use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// A [`JobQueue`] backed by a bounded tokio mpsc channel.
pub struct TokioJobQueue {
    name: String,
    alert_tx: mpsc::Sender<AlertId>,
}

impl TokioJobQueue {
    pub fn new(name: impl Into<String>, alert_tx: mpsc::Sender<AlertId>) -> Self {
        Self {
            name: name.into(),
            alert_tx,
        }
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues without blocking: a full or closed channel surfaces as an
    /// `EnqueueError` so the dispatcher can run its fallback path.
    async fn enqueue(&self, alert_id: AlertId) -> Result<(), EnqueueError> {
        self.alert_tx
            .try_send(alert_id)
            .map_err(|e| EnqueueError {
                queue: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

/// The delivery worker actor.
///
/// Drains alert ids off the queue channel and runs the delivery job for
/// each. Job failures are logged and never crash the worker; the loop
/// shuts down when every queue handle has been dropped.
pub struct DeliveryWorker {
    alert_rx: mpsc::Receiver<AlertId>,
    dispatcher: Arc<Dispatcher>,
}

impl DeliveryWorker {
    pub fn new(alert_rx: mpsc::Receiver<AlertId>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            alert_rx,
            dispatcher,
        }
    }

    /// Runs the worker's main loop.
    pub async fn run(mut self) {
        while let Some(alert_id) = self.alert_rx.recv().await {
            debug!(alert_id, "processing delivery job");
            if let Err(e) = self.dispatcher.perform_delivery(alert_id).await {
                error!(alert_id, error = %e, "delivery job failed");
            }
        }
        info!("Delivery queue closed. Shutting down delivery worker.");
    }
}
