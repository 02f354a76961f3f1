//! Leaf condition evaluation.
//!
//! Implements the per-operator comparison semantics against a resolved field
//! value. The semantics deliberately mirror how the stored rules have always
//! behaved in production, including the quirks: numeric operators degrade to
//! "condition not met" on non-numeric operands instead of erroring, and
//! `contains` on a non-string/non-array field defaults to false while
//! `not_contains` defaults to true. Changing either would silently alter
//! which existing stored rules fire.

use crate::operators::ConditionOperator;
use serde_json::Value;
use tracing::warn;

/// Stateless evaluator for a single field/operator/value comparison.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate one comparison.
    ///
    /// `field_value` is the value resolved from the audit data, `None` when
    /// the path did not resolve. Every operator is total: there is no input
    /// for which this returns an error or panics.
    pub fn evaluate(
        field_value: Option<&Value>,
        operator: &ConditionOperator,
        expected: &Value,
    ) -> bool {
        match operator {
            ConditionOperator::Equals => {
                field_value.is_some_and(|v| Self::strict_eq(v, expected))
            }
            ConditionOperator::NotEquals => {
                !field_value.is_some_and(|v| Self::strict_eq(v, expected))
            }
            ConditionOperator::GreaterThan => {
                // NaN on either side makes the comparison false, so a
                // non-numeric operand silently fails the condition.
                Self::coerce_number(field_value) > Self::coerce_number(Some(expected))
            }
            ConditionOperator::LessThan => {
                Self::coerce_number(field_value) < Self::coerce_number(Some(expected))
            }
            ConditionOperator::Contains => Self::contains(field_value, expected),
            ConditionOperator::NotContains => !Self::contains(field_value, expected),
            ConditionOperator::Exists => Self::exists(field_value),
            ConditionOperator::NotExists => !Self::exists(field_value),
            ConditionOperator::Unknown(raw) => {
                warn!(operator = %raw, "unrecognized operator, treating condition as satisfied");
                true
            }
        }
    }

    /// Strict equality: numbers compare numerically (100 == 100.0), all
    /// other type pairs compare structurally with no coercion.
    fn strict_eq(field: &Value, expected: &Value) -> bool {
        if let (Some(a), Some(b)) = (field.as_f64(), expected.as_f64()) {
            return a == b;
        }
        field == expected
    }

    /// Numeric coercion matching the original runtime's `Number()` rules:
    /// missing -> NaN, null -> 0, booleans -> 0/1, numeric strings parse
    /// (blank strings -> 0), everything else -> NaN.
    fn coerce_number(value: Option<&Value>) -> f64 {
        match value {
            None => f64::NAN,
            Some(Value::Null) => 0.0,
            Some(Value::Bool(b)) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
        }
    }

    /// Substring test for string fields, element membership for array
    /// fields, false for anything else.
    fn contains(field: Option<&Value>, expected: &Value) -> bool {
        match field {
            Some(Value::String(s)) => {
                // Non-string operands are stringified, so contains(5) on a
                // string field looks for "5".
                match expected.as_str() {
                    Some(needle) => s.contains(needle),
                    None => s.contains(&expected.to_string()),
                }
            }
            Some(Value::Array(items)) => items.iter().any(|item| Self::strict_eq(item, expected)),
            _ => false,
        }
    }

    /// Present and not null.
    fn exists(field: Option<&Value>) -> bool {
        field.is_some_and(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(field: Option<&Value>, op: &str, expected: &Value) -> bool {
        ConditionEvaluator::evaluate(field, &ConditionOperator::from(op), expected)
    }

    #[test]
    fn test_equals_numbers_unify() {
        assert!(eval(Some(&json!(100)), "equals", &json!(100.0)));
        assert!(!eval(Some(&json!(100)), "equals", &json!(99)));
    }

    #[test]
    fn test_equals_no_cross_type_coercion() {
        // "5" equals 5 is false: strict equality, not loose.
        assert!(!eval(Some(&json!("5")), "equals", &json!(5)));
        assert!(!eval(Some(&json!(1)), "equals", &json!(true)));
        assert!(eval(Some(&json!(null)), "equals", &json!(null)));
    }

    #[test]
    fn test_equals_missing_field() {
        assert!(!eval(None, "equals", &json!("anything")));
        assert!(eval(None, "not_equals", &json!("anything")));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(eval(Some(&json!(80)), "greater_than", &json!(50)));
        assert!(!eval(Some(&json!(40)), "greater_than", &json!(50)));
        assert!(eval(Some(&json!(40)), "less_than", &json!(50)));
        // Not strictly less than itself.
        assert!(!eval(Some(&json!(50)), "less_than", &json!(50)));
    }

    #[test]
    fn test_numeric_string_coercion() {
        assert!(eval(Some(&json!("80")), "greater_than", &json!(50)));
        assert!(eval(Some(&json!("  80  ")), "greater_than", &json!("50")));
    }

    #[test]
    fn test_non_numeric_operands_never_fire() {
        // NaN comparisons are false in both directions: the condition
        // silently fails rather than erroring.
        assert!(!eval(Some(&json!("fast")), "greater_than", &json!(50)));
        assert!(!eval(Some(&json!("fast")), "less_than", &json!(50)));
        assert!(!eval(None, "greater_than", &json!(50)));
        assert!(!eval(Some(&json!({"a": 1})), "less_than", &json!(50)));
    }

    #[test]
    fn test_null_and_bool_coercion() {
        // Number(null) is 0, Number(true) is 1.
        assert!(eval(Some(&json!(null)), "less_than", &json!(1)));
        assert!(eval(Some(&json!(true)), "greater_than", &json!(0)));
    }

    #[test]
    fn test_contains_string() {
        assert!(eval(Some(&json!("hello world")), "contains", &json!("world")));
        assert!(!eval(Some(&json!("hello world")), "contains", &json!("mars")));
        // Number operand is stringified.
        assert!(eval(Some(&json!("error 404")), "contains", &json!(404)));
    }

    #[test]
    fn test_contains_array_membership() {
        assert!(eval(Some(&json!(["seo", "audit"])), "contains", &json!("seo")));
        assert!(!eval(Some(&json!(["seo", "audit"])), "contains", &json!("se")));
        assert!(eval(Some(&json!([1, 2, 3])), "contains", &json!(2.0)));
    }

    #[test]
    fn test_contains_default_on_other_types() {
        // Asymmetric per-operator defaults, preserved as-is.
        assert!(!eval(Some(&json!(42)), "contains", &json!(4)));
        assert!(eval(Some(&json!(42)), "not_contains", &json!(4)));
        assert!(!eval(None, "contains", &json!("x")));
        assert!(eval(None, "not_contains", &json!("x")));
    }

    #[test]
    fn test_exists() {
        assert!(eval(Some(&json!(0)), "exists", &json!(null)));
        assert!(eval(Some(&json!("")), "exists", &json!(null)));
        assert!(eval(Some(&json!(false)), "exists", &json!(null)));
        assert!(!eval(Some(&json!(null)), "exists", &json!(null)));
        assert!(!eval(None, "exists", &json!(null)));
        assert!(eval(None, "not_exists", &json!(null)));
        assert!(!eval(Some(&json!(1)), "not_exists", &json!(null)));
    }

    #[test]
    fn test_unknown_operator_is_satisfied() {
        assert!(eval(Some(&json!(1)), "bogus_op", &json!(1)));
        assert!(eval(None, "equalz", &json!("typo")));
    }
}
