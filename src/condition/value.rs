use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// How `==`, `!=` and membership tests compare values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EqualityMode {
    /// Primitives are compared after normalising to their string form, so
    /// `"10" == 10` and `"true" == true` hold.
    #[default]
    Loose,
    /// Values must have the same JSON type. Numbers still compare numerically.
    Strict,
}

/// Coerces a value to a number. Only numbers and numeric strings qualify.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// String form of a scalar, used by the prefix/suffix/substring operators.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like `to_text`, but `null` normalises to `"null"` so it can take part in equality.
fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        other => to_text(other),
    }
}

/// Formats a number the way it would print in a JSON document authored by hand:
/// whole floats lose their fractional part.
pub fn format_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
            return format!("{}", f);
        }
    }
    n.to_string()
}

pub fn values_equal(actual: &Value, expected: &Value, mode: EqualityMode) -> bool {
    if let (Value::Number(a), Value::Number(b)) = (actual, expected) {
        return a.as_f64() == b.as_f64();
    }
    match mode {
        EqualityMode::Strict => actual == expected,
        EqualityMode::Loose => match (primitive_text(actual), primitive_text(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => actual == expected,
        },
    }
}

/// `undefined`, `null`, `""` and `[]` are empty.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
