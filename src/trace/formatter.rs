use crate::condition::value::format_number;
use crate::condition::{ConditionDetail, ConditionNode, ConditionReport, LogicalOperator};
use itertools::Itertools;
use serde_json::Value;

enum Piece<'n> {
    Node(&'n ConditionNode, bool),
    Text(&'static str),
}

/// Formats condition reports into human-readable explanations.
pub struct TraceFormatter;

impl TraceFormatter {
    /// Renders `node` with the values recorded in `report`, e.g.
    /// `amount (was 15000) > 10000 AND (riskLevel (was "high") == "high" OR ...)`.
    ///
    /// `report` must come from a detailed evaluation of `node`; leaves are matched
    /// to details by position.
    pub fn format_report(node: &ConditionNode, report: &ConditionReport) -> String {
        let mut result = String::new();
        let mut leaves = report.details.iter();
        let mut stack = vec![Piece::Node(node, false)];

        while let Some(piece) = stack.pop() {
            match piece {
                Piece::Text(text) => result.push_str(text),
                Piece::Node(ConditionNode::Condition(condition), _) => match leaves.next() {
                    Some(detail) => result.push_str(&Self::format_detail(detail)),
                    None => result.push_str(&condition.field),
                },
                Piece::Node(ConditionNode::Group(group), nested) => {
                    let separator = match group.operator {
                        LogicalOperator::And => " AND ",
                        LogicalOperator::Or => " OR ",
                    };
                    if nested {
                        stack.push(Piece::Text(")"));
                    }
                    for (i, child) in group.conditions.iter().enumerate().rev() {
                        stack.push(Piece::Node(child, true));
                        if i > 0 {
                            stack.push(Piece::Text(separator));
                        }
                    }
                    if nested {
                        stack.push(Piece::Text("("));
                    }
                }
            }
        }
        result
    }

    /// Renders every failing leaf of a report, one per line.
    pub fn format_failures(report: &ConditionReport) -> String {
        report
            .details
            .iter()
            .filter(|d| !d.passed)
            .map(Self::format_detail)
            .join("\n")
    }

    /// Format a single leaf as `field (was actual) OP expected`.
    pub fn format_detail(detail: &ConditionDetail) -> String {
        let actual = detail
            .actual_value
            .as_ref()
            .map_or_else(|| "undefined".to_string(), Self::format_value);
        if detail.operator.is_unary() {
            return format!("{} (was {}) {}", detail.field, actual, detail.operator);
        }
        let expected = detail
            .expected_value
            .as_ref()
            .map_or_else(|| "null".to_string(), Self::format_value);
        format!(
            "{} (was {}) {} {}",
            detail.field, actual, detail.operator, expected
        )
    }

    /// Format a value for display.
    fn format_value(value: &Value) -> String {
        match value {
            Value::Number(n) => format_number(n),
            other => other.to_string(),
        }
    }
}
