//! Configuration management for Klaxon
//!
//! This module defines the `Config` struct holding the recipient rules,
//! queue name, and sender identity, plus `SharedConfig`, the process-wide
//! handle through which configuration is atomically replaced. Settings can
//! be loaded from a `klaxon.toml` file merged with environment variables,
//! or built programmatically through `SharedConfig::configure`.

use crate::rules::RecipientRule;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// The queue delivery jobs land on unless configured otherwise.
pub const DEFAULT_QUEUE: &str = "high";

/// The main configuration struct.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level suggested to the host application.
    pub log_level: String,
    /// Name of the queue asynchronous delivery jobs are enqueued on.
    pub queue: String,
    /// Override for the email "From" header. When unset, the email
    /// notifier falls back to the first recipient.
    pub from_address: Option<String>,
    /// YAML files recipient rules are loaded from.
    pub rule_files: Vec<PathBuf>,
    /// The active recipient rules. Unset until configured or loaded.
    #[serde(skip)]
    pub rules: Option<Vec<RecipientRule>>,
}

impl Config {
    /// Loads configuration from the given TOML file, merged with
    /// `KLAXON_`-prefixed environment variables, and compiles any
    /// configured rule files.
    pub fn load(config_path: &str) -> Result<Self> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g., KLAXON_QUEUE=low
            .merge(Env::prefixed("KLAXON_"))
            .extract()?;

        if !config.rule_files.is_empty() {
            config.rules = Some(RecipientRule::load_from_files(&config.rule_files)?);
        }
        Ok(config)
    }

    /// Appends one recipient rule with normalized fields.
    ///
    /// A single recipient is wrapped into a one-element list; an
    /// unspecified notifier falls back to the registry default at
    /// resolution time.
    pub fn add_rule(&mut self, recipients: impl Into<Recipients>, filter: RuleFilter) -> Result<()> {
        let category = filter
            .category
            .map(|pattern| {
                Regex::new(&pattern)
                    .with_context(|| format!("Failed to compile category pattern '{}'", pattern))
            })
            .transpose()?;
        let severity = filter
            .severity
            .map(|pattern| {
                Regex::new(&pattern)
                    .with_context(|| format!("Failed to compile severity pattern '{}'", pattern))
            })
            .transpose()?;

        self.rules.get_or_insert_with(Vec::new).push(RecipientRule {
            category,
            severity,
            notifier: filter.notifier,
            recipients: recipients.into().0,
        });
        Ok(())
    }

    /// Replaces the rule list wholesale.
    pub fn set_rules(&mut self, rules: Vec<RecipientRule>) {
        self.rules = Some(rules);
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            queue: DEFAULT_QUEUE.to_string(),
            from_address: None,
            rule_files: vec![],
            rules: None,
        }
    }
}

/// Matching filters for [`Config::add_rule`].
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    category: Option<String>,
    severity: Option<String>,
    notifier: Option<String>,
}

impl RuleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches alerts whose category contains this pattern.
    pub fn category(mut self, pattern: impl Into<String>) -> Self {
        self.category = Some(pattern.into());
        self
    }

    /// Matches alerts whose severity contains this pattern.
    pub fn severity(mut self, pattern: impl Into<String>) -> Self {
        self.severity = Some(pattern.into());
        self
    }

    /// Delivers through the given notifier key instead of the default
    /// (`"email"`).
    pub fn via(mut self, notifier: impl Into<String>) -> Self {
        self.notifier = Some(notifier.into());
        self
    }
}

/// Recipient list argument for [`Config::add_rule`]; accepts a single
/// address or a list.
#[derive(Debug, Clone)]
pub struct Recipients(pub Vec<String>);

impl From<&str> for Recipients {
    fn from(recipient: &str) -> Self {
        Recipients(vec![recipient.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(recipient: String) -> Self {
        Recipients(vec![recipient])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(recipients: Vec<String>) -> Self {
        Recipients(recipients)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(recipients: Vec<&str>) -> Self {
        Recipients(recipients.into_iter().map(str::to_string).collect())
    }
}

/// Process-wide configuration handle with atomic wholesale replacement.
///
/// `configure` starts from `Config::default()` every time, so previous
/// state is discarded rather than merged: configuring with an empty
/// closure resets the rules to unset. Active dispatch always sees a
/// consistent snapshot.
pub struct SharedConfig {
    current: ArcSwap<Config>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    /// Rebuilds the configuration from defaults, applies `f`, and swaps it
    /// in. If `f` fails, the previous configuration stays active.
    pub fn configure<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Config) -> Result<()>,
    {
        let mut config = Config::default();
        f(&mut config)?;
        self.current.store(Arc::new(config));
        Ok(())
    }

    /// Returns the current configuration snapshot.
    pub fn snapshot(&self) -> Arc<Config> {
        self.current.load_full()
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
