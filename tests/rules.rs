//! Resolution behavior of the recipient-rule matcher against a realistic
//! three-rule routing table.

use klaxon::core::Alert;
use klaxon::rules::{RecipientRule, RuleMatcher};
use regex::Regex;

fn rule(
    category: &str,
    severity: &str,
    recipients: &[&str],
    notifier: Option<&str>,
) -> RecipientRule {
    RecipientRule {
        category: Some(Regex::new(category).unwrap()),
        severity: Some(Regex::new(severity).unwrap()),
        notifier: notifier.map(str::to_string),
        recipients: recipients.iter().map(|r| r.to_string()).collect(),
    }
}

fn routing_table() -> Vec<RecipientRule> {
    vec![
        rule(".*", ".*", &["x@y.com", "z@w.com"], None),
        rule(
            "^test$",
            "(high|low)",
            &["a@b.com", "z@w.com"],
            Some("email"),
        ),
        rule("^test$", "(high|low)", &["1234567890"], Some("sms")),
    ]
}

fn alert(category: &str, severity: &str) -> Alert {
    Alert {
        category: category.to_string(),
        severity: severity.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_only_the_catch_all_rule_matches_an_unrelated_alert() {
    let rules = routing_table();
    let resolved = RuleMatcher::new(&rules).resolve(&alert("whee", "test"));

    assert_eq!(resolved.len(), 1);
    assert_eq!(
        resolved.get("email").unwrap(),
        &vec!["x@y.com".to_string(), "z@w.com".to_string()]
    );
}

#[test]
fn test_all_matching_rules_contribute_deduped_and_sorted() {
    let rules = routing_table();
    let resolved = RuleMatcher::new(&rules).resolve(&alert("test", "high"));

    assert_eq!(resolved.len(), 2);
    // z@w.com appears in two matching email rules but only once in the output.
    assert_eq!(
        resolved.get("email").unwrap(),
        &vec![
            "a@b.com".to_string(),
            "x@y.com".to_string(),
            "z@w.com".to_string()
        ]
    );
    assert_eq!(resolved.get("sms").unwrap(), &vec!["1234567890".to_string()]);
}

#[test]
fn test_resolution_is_idempotent() {
    let rules = routing_table();
    let matcher = RuleMatcher::new(&rules);
    let target = alert("test", "low");

    assert_eq!(matcher.resolve(&target), matcher.resolve(&target));
}

#[test]
fn test_rule_order_does_not_affect_the_result() {
    let mut reversed = routing_table();
    reversed.reverse();
    let target = alert("test", "high");

    assert_eq!(
        RuleMatcher::new(&routing_table()).resolve(&target),
        RuleMatcher::new(&reversed).resolve(&target)
    );
}

#[test]
fn test_severity_patterns_use_search_semantics() {
    // "(high|low)" matches anywhere in the severity, not just exactly.
    let rules = vec![rule("^test$", "(high|low)", &["a@b.com"], None)];
    let resolved = RuleMatcher::new(&rules).resolve(&alert("test", "very-high"));

    assert_eq!(
        resolved.get("email").unwrap(),
        &vec!["a@b.com".to_string()]
    );
}
