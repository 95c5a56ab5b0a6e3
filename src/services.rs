//! Encapsulation for wiring up the dispatch pipeline.

use crate::config::SharedConfig;
use crate::core::AlertStore;
use crate::dispatcher::Dispatcher;
use crate::notifiers::NotifierRegistry;
use crate::queue::{DeliveryWorker, TokioJobQueue};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Builds the in-process queue and dispatcher and spawns the delivery
/// worker.
///
/// The worker shuts down once the dispatcher (and with it the queue
/// sender) is dropped; await the returned handle for a clean shutdown.
pub fn spawn_dispatch_pipeline(
    config: Arc<SharedConfig>,
    store: Arc<dyn AlertStore>,
    registry: Arc<NotifierRegistry>,
    queue_capacity: usize,
) -> (Arc<Dispatcher>, JoinHandle<()>) {
    let queue_name = config.snapshot().queue.clone();
    let (alert_tx, alert_rx) = mpsc::channel(queue_capacity);
    let queue = Arc::new(TokioJobQueue::new(queue_name.clone(), alert_tx));

    let dispatcher = Arc::new(Dispatcher::new(store, queue, registry, config));
    let worker = DeliveryWorker::new(alert_rx, dispatcher.clone());
    let handle = tokio::spawn(worker.run());
    info!(queue = %queue_name, "dispatch pipeline started");

    (dispatcher, handle)
}
