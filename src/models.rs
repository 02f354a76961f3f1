//! Rule engine domain model.
//!
//! Rules are authored in a dashboard rule builder and stored as JSON: a
//! named, severity-tagged wrapper around a boolean condition tree. The tree
//! is heterogeneous and recursive — internal nodes are AND/OR groups, leaves
//! are field/operator/value comparisons against one audit's metrics.

use crate::operators::{ConditionOperator, GroupLogic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

/// Severity attached to violations emitted by a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A user-authored SEO rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Message shown on the violation when the rule fails an audit.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub category: String,
    pub condition: ConditionGroup,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Global rules apply to every project; otherwise the rule is scoped to
    /// its owning project.
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        condition: ConditionGroup,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            message: message.into(),
            severity,
            category: String::new(),
            condition,
            enabled: true,
            global: false,
            project_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Mark the rule as applying to every project.
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Scope the rule to a single project.
    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// One node of a condition tree.
///
/// The stored wire shape has no explicit type tag: a group is an object with
/// `logic` and `conditions` keys, a leaf has `field`/`operator`/`value`. The
/// untagged deserialization tries `Group` first, so node kind is fixed at
/// construction time and a leaf whose field path happens to be named
/// `logic` cannot be misread as a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Leaf(Condition),
}

/// Leaf node: a single field/operator/value comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated path into the audit data, e.g. `performance.score`.
    pub field: String,
    pub operator: ConditionOperator,
    /// Comparison operand; `exists`/`not_exists` rules omit it.
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<ConditionOperator>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Internal node: an AND/OR combinator over child nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub logic: GroupLogic,
    pub conditions: Vec<ConditionNode>,
}

impl ConditionGroup {
    pub fn new(logic: GroupLogic, conditions: Vec<ConditionNode>) -> Self {
        Self { logic, conditions }
    }

    pub fn and(conditions: Vec<ConditionNode>) -> Self {
        Self::new(GroupLogic::And, conditions)
    }

    pub fn or(conditions: Vec<ConditionNode>) -> Self {
        Self::new(GroupLogic::Or, conditions)
    }
}

/// One completed audit's computed metrics, keyed by the dot paths in the
/// field catalog.
#[derive(Debug, Clone, Default)]
pub struct AuditData {
    data: Value,
}

impl AuditData {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: Value = serde_json::from_str(json)?;
        Ok(Self { data })
    }

    /// Resolve a dot-separated field path with safe-navigation semantics.
    ///
    /// Walks objects by key and arrays by numeric index, and returns `None`
    /// the instant any step cannot resolve — a missing path never errors. A
    /// terminal `null` resolves to `Some(Null)`. A final `length` segment on
    /// a string or array yields the element count, which catalog paths like
    /// `meta.title.length` rely on.
    pub fn get_field(&self, path: &str) -> Option<Cow<'_, Value>> {
        let parts: Vec<&str> = path.split('.').collect();
        let mut current = &self.data;

        for (i, part) in parts.iter().enumerate() {
            let terminal = i + 1 == parts.len();
            match current {
                Value::Object(map) => {
                    current = map.get(*part)?;
                }
                Value::Array(arr) => {
                    if *part == "length" {
                        return terminal.then(|| Cow::Owned(Value::from(arr.len())));
                    }
                    let index: usize = part.parse().ok()?;
                    current = arr.get(index)?;
                }
                Value::String(s) => {
                    return (*part == "length" && terminal)
                        .then(|| Cow::Owned(Value::from(s.chars().count())));
                }
                _ => return None,
            }
        }

        Some(Cow::Borrowed(current))
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// Outcome of evaluating one rule against one audit.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub passed: bool,
    pub details: EvaluationDetails,
}

/// Diagnostic payload attached to every evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationDetails {
    pub rule_name: String,
    /// The condition tree that was evaluated; absent when evaluation failed
    /// before completing.
    pub condition: Option<ConditionGroup>,
    pub evaluated_at: DateTime<Utc>,
    /// Set when the fail-open wrapper absorbed an evaluation error.
    pub error: Option<String>,
    /// Per-node trace lines, populated only when tracing is enabled.
    pub trace: Vec<String>,
}

impl EvaluationDetails {
    pub(crate) fn success(rule_name: String, condition: ConditionGroup, trace: Vec<String>) -> Self {
        Self {
            rule_name,
            condition: Some(condition),
            evaluated_at: Utc::now(),
            error: None,
            trace,
        }
    }

    pub(crate) fn failure(rule_name: String, error: String, trace: Vec<String>) -> Self {
        Self {
            rule_name,
            condition: None,
            evaluated_at: Utc::now(),
            error: Some(error),
            trace,
        }
    }
}

/// Emitted when an enabled rule's condition does not hold for an audit.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
    pub details: EvaluationDetails,
}

/// Result of the rule builder's "try before you save" check.
#[derive(Debug, Clone, Serialize)]
pub struct RuleTestOutcome {
    pub success: bool,
    pub passed: Option<bool>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl RuleTestOutcome {
    pub(crate) fn evaluated(passed: bool) -> Self {
        Self {
            success: true,
            passed: Some(passed),
            message: Some(if passed {
                "Condition passed against the sample data".to_string()
            } else {
                "Condition did not pass against the sample data".to_string()
            }),
            error: None,
        }
    }

    pub(crate) fn structural_failure(error: String) -> Self {
        Self {
            success: false,
            passed: None,
            message: None,
            error: Some(error),
        }
    }
}
