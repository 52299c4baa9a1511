use super::context::EvaluationContext;
use super::value::{EqualityMode, is_empty, to_number, to_text, values_equal};
use super::{Condition, Operator};
use serde::Serialize;
use serde_json::Value;

/// The result of evaluating one leaf condition, with the raw compared values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateOutcome {
    pub passed: bool,
    /// `None` when the field path did not resolve.
    pub actual_value: Option<Value>,
    pub expected_value: Option<Value>,
}

/// Evaluates a single condition with loose equality.
pub fn evaluate_predicate(condition: &Condition, context: &EvaluationContext) -> PredicateOutcome {
    evaluate_predicate_with(condition, context, EqualityMode::Loose)
}

/// Evaluates a single condition. Never fails: type mismatches, unresolved
/// fields and unknown operators all yield `passed == false`.
pub fn evaluate_predicate_with(
    condition: &Condition,
    context: &EvaluationContext,
    mode: EqualityMode,
) -> PredicateOutcome {
    let actual = context.resolve(&condition.field);
    let expected = condition.value.as_ref();

    let passed = match (&condition.operator, actual) {
        (Operator::IsEmpty, a) => is_empty(a),
        (Operator::IsNotEmpty, a) => !is_empty(a),
        (Operator::NotEqual, None) => true,
        (_, None) => false,
        (op, Some(a)) => compare(op, a, expected.unwrap_or(&Value::Null), mode),
    };

    PredicateOutcome {
        passed,
        actual_value: actual.cloned(),
        expected_value: expected.cloned(),
    }
}

fn compare(op: &Operator, actual: &Value, expected: &Value, mode: EqualityMode) -> bool {
    match op {
        Operator::GreaterThan => numeric(actual, expected, |a, b| a > b),
        Operator::LessThan => numeric(actual, expected, |a, b| a < b),
        Operator::GreaterThanOrEqual => numeric(actual, expected, |a, b| a >= b),
        Operator::LessThanOrEqual => numeric(actual, expected, |a, b| a <= b),
        Operator::Equal => values_equal(actual, expected, mode),
        Operator::NotEqual => !values_equal(actual, expected, mode),
        Operator::Contains => contains(actual, expected, mode).unwrap_or(false),
        Operator::NotContains => contains(actual, expected, mode).is_some_and(|found| !found),
        Operator::In => member_of(actual, expected, mode).unwrap_or(false),
        Operator::NotIn => member_of(actual, expected, mode).is_some_and(|found| !found),
        Operator::StartsWith => text_pair(actual, expected).is_some_and(|(a, e)| a.starts_with(&e)),
        Operator::EndsWith => text_pair(actual, expected).is_some_and(|(a, e)| a.ends_with(&e)),
        Operator::IsEmpty | Operator::IsNotEmpty | Operator::Unknown(_) => false,
    }
}

fn numeric<F>(actual: &Value, expected: &Value, f: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (to_number(actual), to_number(expected)) {
        (Some(a), Some(e)) => f(a, e),
        _ => false,
    }
}

/// `Some(found)` when `actual` is an array or a string, `None` on a type mismatch.
fn contains(actual: &Value, expected: &Value, mode: EqualityMode) -> Option<bool> {
    match actual {
        Value::Array(items) => Some(items.iter().any(|item| values_equal(item, expected, mode))),
        Value::String(s) => to_text(expected).map(|needle| s.contains(&needle)),
        _ => None,
    }
}

/// `Some(found)` when `expected` is an array, `None` otherwise.
fn member_of(actual: &Value, expected: &Value, mode: EqualityMode) -> Option<bool> {
    match expected {
        Value::Array(items) => Some(items.iter().any(|item| values_equal(actual, item, mode))),
        _ => None,
    }
}

fn text_pair(actual: &Value, expected: &Value) -> Option<(String, String)> {
    Some((to_text(actual)?, to_text(expected)?))
}
