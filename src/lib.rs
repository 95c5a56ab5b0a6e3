//! Klaxon - an in-process alert escalation and notification router
//!
//! Callers report exceptions or arbitrary conditions, Klaxon persists them
//! as alert records, classifies them against configured recipient rules,
//! and dispatches notifications through pluggable channels, asynchronously
//! via a background delivery worker.

pub mod config;
pub mod core;
pub mod dispatcher;
pub mod notifiers;
pub mod queue;
pub mod rules;
pub mod services;
pub mod store;

// Re-export the types most callers need.
pub use crate::core::{Alert, AlertId, AlertOptions, Notifier};
pub use crate::config::{Config, RuleFilter, SharedConfig};
pub use crate::dispatcher::Dispatcher;
pub use crate::notifiers::NotifierRegistry;
