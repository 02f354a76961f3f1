//! Rule engine: condition-tree walk and rule-set evaluation.
//!
//! The walk is a pure, synchronous computation over its two inputs and owns
//! no shared state, so one engine can be called concurrently from any number
//! of audit workers. Every per-rule failure is absorbed at the rule boundary:
//! a malformed rule yields a fail-open pass with the error attached as
//! detail, and can never abort the rest of the rule set.

use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::models::{
    AuditData, Condition, ConditionGroup, ConditionNode, EvaluationDetails, EvaluationResult,
    Rule, RuleTestOutcome, Violation,
};
use crate::operators::GroupLogic;
use serde_json::Value;
use tracing::warn;

/// Condition trees come from stored JSON and cannot be cyclic, but a bound
/// on nesting keeps a pathological tree from blowing the stack.
const MAX_DEPTH: usize = 64;

/// Evaluates rules against audit data.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    trace_enabled: bool,
    fail_closed: bool,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a per-node trace in the evaluation details.
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// Treat evaluation errors as failed instead of passed. The default is
    /// fail-open: a buggy custom rule must never block an audit.
    pub fn with_fail_closed(mut self) -> Self {
        self.fail_closed = true;
        self
    }

    /// Evaluate one rule against one audit. Never returns an error outward:
    /// any internal failure is folded into the result per the configured
    /// fail-open/fail-closed policy.
    pub fn evaluate(&self, rule: &Rule, audit: &AuditData) -> EvaluationResult {
        let mut trace = Vec::new();

        match self.evaluate_group(&rule.condition, audit, &mut trace, 0, "root") {
            Ok(passed) => EvaluationResult {
                passed,
                details: EvaluationDetails::success(
                    rule.name.clone(),
                    rule.condition.clone(),
                    trace,
                ),
            },
            Err(err) => {
                warn!(
                    rule_id = %rule.id,
                    rule_name = %rule.name,
                    error = %err,
                    fail_closed = self.fail_closed,
                    "rule evaluation failed"
                );
                EvaluationResult {
                    passed: !self.fail_closed,
                    details: EvaluationDetails::failure(rule.name.clone(), err.to_string(), trace),
                }
            }
        }
    }

    /// Evaluate a rule set in order, emitting one violation per failed rule.
    ///
    /// Disabled rules are skipped. Violations come out in the same order the
    /// rules were supplied, with no sorting or deduplication; persisting the
    /// batch is the store's job, done once after the whole set has run.
    pub fn evaluate_rule_set(&self, rules: &[Rule], audit: &AuditData) -> Vec<Violation> {
        rules
            .iter()
            .filter(|rule| rule.enabled)
            .filter_map(|rule| {
                let result = self.evaluate(rule, audit);
                (!result.passed).then(|| Violation {
                    rule_id: rule.id.clone(),
                    message: rule.message.clone(),
                    severity: rule.severity,
                    details: result.details,
                })
            })
            .collect()
    }

    /// Rule-builder "try before you save": evaluate an arbitrary condition
    /// tree, given as raw JSON, against sample data.
    pub fn test_rule(&self, condition: &Value, sample_data: &Value) -> RuleTestOutcome {
        let group: ConditionGroup = match serde_json::from_value(condition.clone()) {
            Ok(group) => group,
            Err(err) => {
                return RuleTestOutcome::structural_failure(format!(
                    "invalid condition tree: {}",
                    err
                ));
            }
        };

        let audit = AuditData::new(sample_data.clone());
        let mut trace = Vec::new();

        match self.evaluate_group(&group, &audit, &mut trace, 0, "root") {
            Ok(passed) => RuleTestOutcome::evaluated(passed),
            Err(err) => RuleTestOutcome::structural_failure(err.to_string()),
        }
    }

    fn evaluate_node(
        &self,
        node: &ConditionNode,
        audit: &AuditData,
        trace: &mut Vec<String>,
        depth: usize,
        path: &str,
    ) -> Result<bool> {
        match node {
            ConditionNode::Leaf(cond) => Ok(self.evaluate_condition(cond, audit, trace, path)),
            ConditionNode::Group(group) => self.evaluate_group(group, audit, trace, depth, path),
        }
    }

    fn evaluate_condition(
        &self,
        cond: &Condition,
        audit: &AuditData,
        trace: &mut Vec<String>,
        path: &str,
    ) -> bool {
        let resolved = audit.get_field(&cond.field);
        let matched =
            ConditionEvaluator::evaluate(resolved.as_deref(), &cond.operator, &cond.value);

        if self.trace_enabled {
            trace.push(format!(
                "{}: {} {} {} => {}",
                path,
                cond.field,
                cond.operator,
                cond.value,
                if matched { "PASS" } else { "FAIL" }
            ));
        }

        matched
    }

    fn evaluate_group(
        &self,
        group: &ConditionGroup,
        audit: &AuditData,
        trace: &mut Vec<String>,
        depth: usize,
        path: &str,
    ) -> Result<bool> {
        if depth > MAX_DEPTH {
            return Err(RuleError::DepthExceeded(MAX_DEPTH));
        }

        // Vacuous truth: an empty group passes regardless of its logic
        // operator. Deliberate policy, checked before branching.
        if group.conditions.is_empty() {
            if self.trace_enabled {
                trace.push(format!("{}: empty {} group, vacuously true", path, group.logic));
            }
            return Ok(true);
        }

        match group.logic {
            GroupLogic::And => {
                for (i, child) in group.conditions.iter().enumerate() {
                    let child_path = format!("{}.conditions[{}]", path, i);
                    if !self.evaluate_node(child, audit, trace, depth + 1, &child_path)? {
                        if self.trace_enabled {
                            trace.push(format!("{}: AND short-circuit at child {}", path, i));
                        }
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            GroupLogic::Or => {
                for (i, child) in group.conditions.iter().enumerate() {
                    let child_path = format!("{}.conditions[{}]", path, i);
                    if self.evaluate_node(child, audit, trace, depth + 1, &child_path)? {
                        if self.trace_enabled {
                            trace.push(format!("{}: OR short-circuit at child {}", path, i));
                        }
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}
