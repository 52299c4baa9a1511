use super::context::EvaluationContext;
use super::predicate::evaluate_predicate_with;
use super::value::EqualityMode;
use super::{Condition, ConditionGroup, ConditionNode, LogicalOperator, Operator};
use crate::trace::TraceFormatter;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

/// Diagnostic record for one evaluated leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDetail {
    pub field: String,
    pub operator: Operator,
    pub actual_value: Option<Value>,
    pub expected_value: Option<Value>,
    pub passed: bool,
}

/// Outcome of a detailed evaluation: one detail per leaf, depth-first, left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionReport {
    pub passed: bool,
    pub details: Vec<ConditionDetail>,
}

impl ConditionReport {
    /// Explains the outcome from the leaves that agree with it, e.g.
    /// `amount (was 15000) > 10000`. Failures are listed for a failed report.
    pub fn reason(&self) -> String {
        if self.details.is_empty() {
            return if self.passed {
                "no conditions".to_string()
            } else {
                "no condition passed".to_string()
            };
        }
        self.details
            .iter()
            .filter(|d| d.passed == self.passed)
            .map(TraceFormatter::format_detail)
            .join("; ")
    }
}

/// One open group on the explicit evaluation stack.
struct Frame<'n> {
    operator: LogicalOperator,
    children: &'n [ConditionNode],
    next: usize,
    passed: bool,
}

impl<'n> Frame<'n> {
    fn new(group: &'n ConditionGroup) -> Self {
        Self {
            operator: group.operator,
            children: &group.conditions,
            next: 0,
            // Identity element: an empty AND passes, an empty OR fails.
            passed: group.operator == LogicalOperator::And,
        }
    }

    fn absorb(&mut self, child_passed: bool) {
        self.passed = match self.operator {
            LogicalOperator::And => self.passed && child_passed,
            LogicalOperator::Or => self.passed || child_passed,
        };
    }

    fn decided(&self) -> bool {
        match self.operator {
            LogicalOperator::And => !self.passed,
            LogicalOperator::Or => self.passed,
        }
    }

    fn next_child(&mut self, short_circuit: bool) -> Option<&'n ConditionNode> {
        if short_circuit && self.decided() {
            return None;
        }
        let child = self.children.get(self.next)?;
        self.next += 1;
        Some(child)
    }
}

/// Evaluates condition trees against a single context.
///
/// Traversal uses an explicit stack rather than recursion, so arbitrarily deep
/// nesting cannot exhaust the call stack.
pub struct ConditionEngine<'a> {
    context: &'a EvaluationContext,
    mode: EqualityMode,
}

impl<'a> ConditionEngine<'a> {
    pub fn new(context: &'a EvaluationContext, mode: EqualityMode) -> Self {
        Self { context, mode }
    }

    /// Evaluates `node`, short-circuiting groups once their outcome is known.
    pub fn evaluate(&self, node: &ConditionNode) -> bool {
        self.run(node, None)
    }

    /// Evaluates every leaf below `node`, with no short-circuiting.
    pub fn evaluate_with_details(&self, node: &ConditionNode) -> ConditionReport {
        let mut details = Vec::with_capacity(node.leaf_count());
        let passed = self.run(node, Some(&mut details));
        ConditionReport { passed, details }
    }

    /// `AND` across a transition's groups. No groups means no restriction.
    pub fn evaluate_all(&self, groups: &[ConditionNode]) -> bool {
        groups.iter().all(|group| self.evaluate(group))
    }

    /// Detailed `AND` across groups; every group is evaluated.
    pub fn evaluate_all_with_details(&self, groups: &[ConditionNode]) -> ConditionReport {
        let mut details = Vec::new();
        let mut passed = true;
        for group in groups {
            passed &= self.run(group, Some(&mut details));
        }
        ConditionReport { passed, details }
    }

    fn run(&self, root: &ConditionNode, mut details: Option<&mut Vec<ConditionDetail>>) -> bool {
        let short_circuit = details.is_none();
        let mut stack: Vec<Frame<'_>> = Vec::new();
        let mut pending = Some(root);
        let mut produced: Option<bool> = None;

        loop {
            if let Some(node) = pending.take() {
                match node {
                    ConditionNode::Condition(condition) => {
                        produced = Some(self.test(condition, details.as_mut()));
                    }
                    ConditionNode::Group(group) => stack.push(Frame::new(group)),
                }
            }

            // Only reached with an empty stack when the root itself is a leaf.
            let Some(frame) = stack.last_mut() else {
                return produced.unwrap_or(false);
            };

            if let Some(child_passed) = produced.take() {
                frame.absorb(child_passed);
            }
            if let Some(child) = frame.next_child(short_circuit) {
                pending = Some(child);
                continue;
            }

            let finished = frame.passed;
            stack.pop();
            if stack.is_empty() {
                return finished;
            }
            produced = Some(finished);
        }
    }

    fn test(&self, condition: &Condition, details: Option<&mut &mut Vec<ConditionDetail>>) -> bool {
        let outcome = evaluate_predicate_with(condition, self.context, self.mode);
        if let Some(out) = details {
            out.push(ConditionDetail {
                field: condition.field.clone(),
                operator: condition.operator.clone(),
                actual_value: outcome.actual_value,
                expected_value: outcome.expected_value,
                passed: outcome.passed,
            });
        }
        outcome.passed
    }
}
