//! FixFirst SEO rule engine.
//!
//! Evaluates user-authored SEO rules against completed audit data:
//! - JSON rule definitions with nested AND/OR condition trees
//! - dot-path field resolution with safe-navigation semantics
//! - fail-open per-rule error isolation (a buggy rule never blocks an audit)
//! - batch violation recording per audit run

pub mod catalog;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod operators;
pub mod store;

pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use models::{
    AuditData, Condition, ConditionGroup, ConditionNode, EvaluationDetails, EvaluationResult,
    Rule, RuleTestOutcome, Severity, Violation,
};
pub use operators::{ConditionOperator, GroupLogic};
pub use store::RuleStore;
