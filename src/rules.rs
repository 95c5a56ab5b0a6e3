//! The recipient-rule matching engine.
//!
//! This module contains the data structures and logic for parsing,
//! compiling, and evaluating recipient rules against alerts.

use crate::core::Alert;
use crate::notifiers::DEFAULT_NOTIFIER;
use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// A single recipient rule that has been compiled for matching.
///
/// A rule matches an alert when both its category and severity patterns
/// match; a pattern left unset matches everything. Matching uses regex
/// search semantics: a pattern matches if it is found anywhere in the
/// target string, not only on full-string equality.
#[derive(Debug, Clone)]
pub struct RecipientRule {
    /// Pattern tested against the alert category. `None` matches all.
    pub category: Option<Regex>,
    /// Pattern tested against the alert severity. `None` matches all.
    pub severity: Option<Regex>,
    /// Key of the notifier to deliver through. `None` falls back to the
    /// registry default.
    pub notifier: Option<String>,
    /// Recipient addresses. Duplicates are allowed at definition time and
    /// removed during resolution.
    pub recipients: Vec<String>,
}

impl RecipientRule {
    /// Evaluates the rule against an alert.
    pub fn is_match(&self, alert: &Alert) -> bool {
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |re| re.is_match(&alert.category));
        let severity_ok = self
            .severity
            .as_ref()
            .map_or(true, |re| re.is_match(&alert.severity));
        category_ok && severity_ok
    }

    /// Loads and compiles rules from the given YAML files.
    pub fn load_from_files(rule_files: &[PathBuf]) -> Result<Vec<RecipientRule>> {
        let mut rules = Vec::new();
        for file_path in rule_files {
            let file_content = fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read rule file: {}", file_path.display()))?;

            let file_rules: Vec<FileRule> =
                serde_yml::from_str(&file_content).with_context(|| {
                    format!(
                        "Failed to parse YAML from rule file: {}",
                        file_path.display()
                    )
                })?;

            for file_rule in file_rules {
                rules.push(file_rule.compile().with_context(|| {
                    format!("Invalid rule in file: {}", file_path.display())
                })?);
            }
        }
        Ok(rules)
    }
}

/// Resolves the recipients for an alert against a list of recipient rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher<'a> {
    rules: &'a [RecipientRule],
}

impl<'a> RuleMatcher<'a> {
    pub fn new(rules: &'a [RecipientRule]) -> Self {
        Self { rules }
    }

    /// Maps the alert to a per-notifier recipient set.
    ///
    /// Every matching rule contributes its recipients to the bucket of its
    /// notifier key (the registry default when unset). Each bucket is
    /// deduplicated and sorted lexicographically, so resolution is
    /// deterministic and idempotent. An empty rule list resolves to an
    /// empty map.
    pub fn resolve(&self, alert: &Alert) -> BTreeMap<String, Vec<String>> {
        let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for rule in self.rules.iter().filter(|rule| rule.is_match(alert)) {
            metrics::counter!("recipient_rules_matched").increment(1);
            let key = rule
                .notifier
                .clone()
                .unwrap_or_else(|| DEFAULT_NOTIFIER.to_string());
            buckets
                .entry(key)
                .or_default()
                .extend(rule.recipients.iter().cloned());
        }

        // A matching rule with no recipients contributes nothing.
        buckets.retain(|_, recipients| !recipients.is_empty());

        for recipients in buckets.values_mut() {
            *recipients = std::mem::take(recipients)
                .into_iter()
                .sorted()
                .dedup()
                .collect();
        }

        buckets
    }
}

// --- Deserialization-only structs ---

/// A recipient rule as defined in a YAML file, before compilation.
#[derive(Debug, Deserialize)]
struct FileRule {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    notifier: Option<String>,
    recipients: Vec<String>,
}

impl FileRule {
    fn compile(self) -> Result<RecipientRule> {
        let category = self
            .category
            .map(|pattern| {
                Regex::new(&pattern)
                    .with_context(|| format!("Failed to compile category pattern '{}'", pattern))
            })
            .transpose()?;
        let severity = self
            .severity
            .map(|pattern| {
                Regex::new(&pattern)
                    .with_context(|| format!("Failed to compile severity pattern '{}'", pattern))
            })
            .transpose()?;

        Ok(RecipientRule {
            category,
            severity,
            notifier: self.notifier,
            recipients: self.recipients,
        })
    }
}
