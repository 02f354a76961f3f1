//! Rule and violation storage.
//!
//! DashMap-backed, thread-safe store for rule definitions plus per-audit
//! violation batches. Concurrent audits never contend on writes: each run
//! records its violations under a fresh audit id in a single batch after the
//! whole rule set has been evaluated, so a crash mid-run loses that run's
//! batch entirely rather than leaving a partial set behind.

use crate::error::{Result, RuleError};
use crate::models::{Rule, Violation};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Thread-safe store for rules and recorded violations.
#[derive(Clone, Default)]
pub struct RuleStore {
    rules: Arc<DashMap<String, Rule>>,
    /// Violation batches keyed by audit run id.
    violations: Arc<DashMap<String, Vec<Violation>>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Load a rule, replacing any existing rule with the same id.
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, rule_name = %rule.name))]
    pub fn load(&self, rule: Rule) -> Result<()> {
        Self::validate(&rule)?;

        let rule_id = rule.id.clone();
        self.rules.insert(rule_id.clone(), rule);

        info!("rule loaded: {}", rule_id);
        Ok(())
    }

    /// Load a rule from its stored JSON form.
    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<String> {
        let rule: Rule = serde_json::from_str(json)?;
        let rule_id = rule.id.clone();
        self.load(rule)?;
        Ok(rule_id)
    }

    /// Update an existing rule.
    #[instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub fn update(&self, rule: Rule) -> Result<()> {
        if !self.rules.contains_key(&rule.id) {
            warn!("update for unknown rule: {}", rule.id);
            return Err(RuleError::RuleNotFound(rule.id));
        }
        self.load(rule)
    }

    #[instrument(skip(self))]
    pub fn delete(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("rule deleted: {}", rule_id);
            Ok(())
        } else {
            warn!("delete for unknown rule: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    pub fn get(&self, rule_id: &str) -> Option<Rule> {
        self.rules.get(rule_id).map(|r| r.clone())
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.key().clone()).collect()
    }

    pub fn list_all(&self) -> Vec<Rule> {
        self.rules.iter().map(|r| r.value().clone()).collect()
    }

    /// The rule set to run for one project's audit: enabled rules scoped to
    /// the project, unioned with enabled global rules.
    pub fn rules_for_project(&self, project_id: &str) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|r| {
                let rule = r.value();
                rule.enabled
                    && (rule.global || rule.project_id.as_deref() == Some(project_id))
            })
            .map(|r| r.value().clone())
            .collect()
    }

    /// Load several rules; failures are reported but do not stop the batch.
    #[instrument(skip(self, rules))]
    pub fn load_batch(&self, rules: Vec<Rule>) -> Result<Vec<String>> {
        let mut loaded_ids = Vec::with_capacity(rules.len());
        let mut failed = 0usize;

        for rule in rules {
            let rule_id = rule.id.clone();
            match self.load(rule) {
                Ok(()) => loaded_ids.push(rule_id),
                Err(err) => {
                    failed += 1;
                    warn!(rule_id = %rule_id, error = %err, "rule rejected during batch load");
                }
            }
        }

        info!("batch load: {} loaded, {} rejected", loaded_ids.len(), failed);
        Ok(loaded_ids)
    }

    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("cleared {} rules", count);
    }

    /// Record one audit run's violations as a single batch.
    ///
    /// Called once per run after the full rule set has been evaluated; the
    /// batch replaces nothing because every run uses a fresh audit id.
    #[instrument(skip(self, violations), fields(count = violations.len()))]
    pub fn record_violations(&self, audit_id: &str, violations: Vec<Violation>) {
        info!("recording {} violations for audit {}", violations.len(), audit_id);
        self.violations.insert(audit_id.to_string(), violations);
    }

    /// Violations recorded for one audit run, in evaluation order.
    pub fn violations_for_audit(&self, audit_id: &str) -> Vec<Violation> {
        self.violations
            .get(audit_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Minimal structural validation at load time. Empty condition groups
    /// are legal: they evaluate vacuously true by policy.
    fn validate(rule: &Rule) -> Result<()> {
        if rule.id.is_empty() {
            return Err(RuleError::ParseError("rule id must not be empty".to_string()));
        }
        if rule.name.is_empty() {
            return Err(RuleError::ParseError("rule name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ConditionGroup, ConditionNode, Severity};
    use crate::operators::ConditionOperator;

    fn sample_rule(id: &str, name: &str) -> Rule {
        let mut rule = Rule::new(
            name,
            "sample message",
            Severity::Warning,
            ConditionGroup::and(vec![ConditionNode::Leaf(Condition::new(
                "seo.score",
                ConditionOperator::GreaterThan,
                50,
            ))]),
        );
        rule.id = id.to_string();
        rule
    }

    fn sample_violation(rule_id: &str) -> Violation {
        Violation {
            rule_id: rule_id.to_string(),
            message: "violated".to_string(),
            severity: Severity::Error,
            details: crate::models::EvaluationDetails::success(
                "v".to_string(),
                ConditionGroup::and(vec![]),
                Vec::new(),
            ),
        }
    }

    #[test]
    fn test_load_and_get() {
        let store = RuleStore::new();
        store.load(sample_rule("rule-001", "test")).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains("rule-001"));
        assert_eq!(store.get("rule-001").unwrap().name, "test");
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_load_from_json() {
        let store = RuleStore::new();
        let id = store
            .load_from_json(
                r#"{
                    "id": "rule-json",
                    "name": "from json",
                    "severity": "INFO",
                    "condition": {"logic": "AND", "conditions": []}
                }"#,
            )
            .unwrap();

        assert_eq!(id, "rule-json");
        assert!(store.contains("rule-json"));
    }

    #[test]
    fn test_load_rejects_empty_identity() {
        let store = RuleStore::new();
        assert!(store.load(sample_rule("", "test")).is_err());

        let mut unnamed = sample_rule("rule-001", "x");
        unnamed.name = String::new();
        assert!(store.load(unnamed).is_err());
    }

    #[test]
    fn test_empty_group_is_loadable() {
        let store = RuleStore::new();
        let rule = Rule::new(
            "vacuous",
            "always passes",
            Severity::Info,
            ConditionGroup::or(vec![]),
        );
        store.load(rule).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update() {
        let store = RuleStore::new();
        store.load(sample_rule("rule-001", "before")).unwrap();
        store.update(sample_rule("rule-001", "after")).unwrap();
        assert_eq!(store.get("rule-001").unwrap().name, "after");

        assert!(store.update(sample_rule("rule-999", "missing")).is_err());
    }

    #[test]
    fn test_delete() {
        let store = RuleStore::new();
        store.load(sample_rule("rule-001", "test")).unwrap();
        store.delete("rule-001").unwrap();
        assert!(!store.contains("rule-001"));
        assert!(store.delete("rule-001").is_err());
    }

    #[test]
    fn test_rules_for_project() {
        let store = RuleStore::new();

        let scoped = sample_rule("scoped", "scoped").for_project("proj-1");
        let global = sample_rule("global", "global").global();
        let other = sample_rule("other", "other project").for_project("proj-2");
        let off = sample_rule("off", "disabled global").global().disabled();

        store
            .load_batch(vec![scoped, global, other, off])
            .unwrap();

        let mut ids: Vec<_> = store
            .rules_for_project("proj-1")
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["global", "scoped"]);
    }

    #[test]
    fn test_load_batch_skips_invalid() {
        let store = RuleStore::new();
        let loaded = store
            .load_batch(vec![
                sample_rule("a", "a"),
                sample_rule("", "invalid"),
                sample_rule("b", "b"),
            ])
            .unwrap();

        assert_eq!(loaded, vec!["a", "b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_violation_batches_by_audit() {
        let store = RuleStore::new();

        store.record_violations(
            "audit-1",
            vec![sample_violation("r1"), sample_violation("r2")],
        );
        store.record_violations("audit-2", vec![sample_violation("r3")]);

        let batch = store.violations_for_audit("audit-1");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].rule_id, "r1");
        assert_eq!(batch[1].rule_id, "r2");

        assert_eq!(store.violations_for_audit("audit-2").len(), 1);
        assert!(store.violations_for_audit("audit-404").is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = RuleStore::new();
        let store_clone = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                store_clone
                    .load(sample_rule(&format!("rule-{}", i), &format!("t-{}", i)))
                    .unwrap();
            }
        });

        for i in 100..200 {
            store
                .load(sample_rule(&format!("rule-{}", i), &format!("t-{}", i)))
                .unwrap();
        }

        handle.join().unwrap();
        assert_eq!(store.len(), 200);
    }
}
