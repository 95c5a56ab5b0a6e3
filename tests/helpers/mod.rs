#![allow(dead_code)]

use async_trait::async_trait;
use klaxon::core::{Alert, AlertId, EnqueueError, JobQueue, MailTransport, Notifier};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::sync::Notify as TaskNotify;

/// Initializes a tracing subscriber for test diagnostics. Safe to call
/// from every test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A notifier that records every delivery and can be awaited on.
#[derive(Clone)]
pub struct RecordingNotifier {
    pub deliveries: Arc<Mutex<Vec<(Vec<String>, Alert)>>>,
    pub count: Arc<AtomicUsize>,
    pub wakeup: Arc<TaskNotify>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(AtomicUsize::new(0)),
            wakeup: Arc::new(TaskNotify::new()),
        }
    }

    pub fn deliveries(&self) -> Vec<(Vec<String>, Alert)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub async fn wait_for_count(&self, target_count: usize, timeout: std::time::Duration) {
        let wait_future = async {
            while self.count.load(Ordering::SeqCst) < target_count {
                self.wakeup.notified().await;
            }
        };

        tokio::time::timeout(timeout, wait_future)
            .await
            .expect("Timed out waiting for notifications");
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipients: &[String], alert: &Alert) -> anyhow::Result<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push((recipients.to_vec(), alert.clone()));
        self.count.fetch_add(1, Ordering::SeqCst);
        self.wakeup.notify_one();
        Ok(())
    }
}

/// A notifier whose every delivery fails.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _recipients: &[String], _alert: &Alert) -> anyhow::Result<()> {
        anyhow::bail!("channel unavailable")
    }
}

/// A queue that rejects every job, for exercising the fallback path.
pub struct RejectingQueue;

#[async_trait]
impl JobQueue for RejectingQueue {
    fn name(&self) -> &str {
        "high"
    }

    async fn enqueue(&self, _alert_id: AlertId) -> Result<(), EnqueueError> {
        Err(EnqueueError {
            queue: "high".to_string(),
            reason: "queue backend is down".to_string(),
        })
    }
}

/// A mail transport that records what it was asked to send.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<(String, String, String, String)>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, from: &str, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((
            from.to_string(),
            to.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}
