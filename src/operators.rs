//! Condition and group operator definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaf condition operator.
///
/// Stored rules carry the operator as a plain string, and rule authors can
/// (and do) save rules with misspelled operators. An unrecognized spelling
/// deserializes into [`ConditionOperator::Unknown`] rather than failing rule
/// load; the evaluator treats it as satisfied and logs a warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    NotContains,
    Exists,
    NotExists,
    /// Catch-all preserving the raw spelling for diagnostics.
    Unknown(String),
}

impl From<String> for ConditionOperator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "exists" => Self::Exists,
            "not_exists" => Self::NotExists,
            _ => Self::Unknown(s),
        }
    }
}

impl From<&str> for ConditionOperator {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Unknown(raw) => raw.as_str(),
        };
        write!(f, "{}", s)
    }
}

/// Logic combinator for a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupLogic {
    And,
    Or,
}

impl fmt::Display for GroupLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}
