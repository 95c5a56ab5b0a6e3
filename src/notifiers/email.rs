//! The email channel, the reference notifier implementation.

use crate::config::SharedConfig;
use crate::core::{Alert, MailTransport, Notifier};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Delivers alerts by email through an injected [`MailTransport`].
///
/// The sender address is the configured `from_address` override when
/// present, otherwise the first recipient, so a delivery never lacks a
/// From header. Transport failures propagate to the caller; the dispatch
/// layer is responsible for containing them.
pub struct EmailNotifier {
    transport: Arc<dyn MailTransport>,
    config: Arc<SharedConfig>,
}

impl EmailNotifier {
    pub fn new(transport: Arc<dyn MailTransport>, config: Arc<SharedConfig>) -> Self {
        Self { transport, config }
    }

    fn subject(alert: &Alert) -> String {
        format!(
            "[Klaxon] [{}] {} ({})",
            alert.severity, alert.message, alert.category
        )
    }

    fn body(alert: &Alert) -> String {
        format!(
            "Alert raised by Klaxon on your site:\n\n\
             Message: {}\n\
             Category: {}\n\
             Severity: {}\n\
             Exception: {}\n\
             Backtrace: {}\n",
            alert.message,
            alert.category,
            alert.severity,
            alert.exception.as_deref().unwrap_or(""),
            alert.backtrace.as_deref().unwrap_or(""),
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, recipients: &[String], alert: &Alert) -> Result<()> {
        let Some(first_recipient) = recipients.first() else {
            return Ok(());
        };

        let from = self
            .config
            .snapshot()
            .from_address
            .clone()
            .unwrap_or_else(|| first_recipient.clone());
        let to = recipients.join(", ");

        self.transport
            .deliver(&from, &to, &Self::subject(alert), &Self::body(alert))
            .await
    }
}

/// A [`MailTransport`] that only logs. Useful for validating the dispatch
/// pipeline and for local debugging.
pub struct LoggingTransport;

#[async_trait]
impl MailTransport for LoggingTransport {
    async fn deliver(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(%from, %to, %subject, "mail delivered to logging transport");
        debug!(%body, "mail body");
        Ok(())
    }
}
