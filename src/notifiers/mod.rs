//! The notifier registry powering pluggable delivery channels.

pub mod email;

use crate::core::Notifier;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Key rules fall back to when they name no notifier.
pub const DEFAULT_NOTIFIER: &str = "email";

/// Process-wide mapping from notifier key to channel implementation.
///
/// Entries are added through explicit registration and never removed.
/// Re-registering a key silently replaces the previous entry. A missing
/// key is not an error at this layer; callers decide how to handle it.
pub struct NotifierRegistry {
    notifiers: RwLock<HashMap<String, Arc<dyn Notifier>>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self {
            notifiers: RwLock::new(HashMap::new()),
        }
    }

    /// Stores the notifier under `key`, replacing any previous entry.
    pub fn register(&self, key: impl Into<String>, notifier: Arc<dyn Notifier>) {
        self.notifiers.write().unwrap().insert(key.into(), notifier);
    }

    /// Looks up the notifier registered under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Notifier>> {
        self.notifiers.read().unwrap().get(key).cloned()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Alert;
    use async_trait::async_trait;

    struct NoopNotifier(&'static str);

    #[async_trait]
    impl Notifier for NoopNotifier {
        async fn notify(&self, _recipients: &[String], _alert: &Alert) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lookup_of_missing_key_is_none() {
        let registry = NotifierRegistry::new();
        assert!(registry.get("sms").is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = NotifierRegistry::new();
        registry.register("sms", Arc::new(NoopNotifier("sms")));
        assert!(registry.get("sms").is_some());
    }

    #[test]
    fn test_reregistration_replaces_silently() {
        let registry = NotifierRegistry::new();
        let first: Arc<dyn Notifier> = Arc::new(NoopNotifier("first"));
        let second: Arc<dyn Notifier> = Arc::new(NoopNotifier("second"));

        registry.register("email", first);
        registry.register("email", second.clone());

        let looked_up = registry.get("email").unwrap();
        assert!(Arc::ptr_eq(&looked_up, &second));
    }
}
