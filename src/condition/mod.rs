use crate::error::DefinitionParseError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod context;
mod engine;
pub mod predicate;
pub mod value;

pub use context::{EvaluationContext, WorkflowMeta};
pub use engine::{ConditionDetail, ConditionEngine, ConditionReport};
pub use predicate::{PredicateOutcome, evaluate_predicate, evaluate_predicate_with};
pub use value::EqualityMode;

/// Comparison operators available to a leaf condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    NotEqual,
    Contains,
    NotContains,
    In,
    NotIn,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    /// Anything else found in stored data. Always fails.
    Unknown(String),
}

impl Operator {
    pub fn symbol(&self) -> &str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "NOT_CONTAINS",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::IsEmpty => "IS_EMPTY",
            Operator::IsNotEmpty => "IS_NOT_EMPTY",
            Operator::Unknown(s) => s,
        }
    }

    /// Emptiness checks take no comparison value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            ">" => Operator::GreaterThan,
            "<" => Operator::LessThan,
            ">=" => Operator::GreaterThanOrEqual,
            "<=" => Operator::LessThanOrEqual,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "CONTAINS" => Operator::Contains,
            "NOT_CONTAINS" => Operator::NotContains,
            "IN" => Operator::In,
            "NOT_IN" => Operator::NotIn,
            "STARTS_WITH" => Operator::StartsWith,
            "ENDS_WITH" => Operator::EndsWith,
            "IS_EMPTY" => Operator::IsEmpty,
            "IS_NOT_EMPTY" => Operator::IsNotEmpty,
            _ => Operator::Unknown(s),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(s) => s,
            other => other.symbol().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How the children of a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

/// A leaf predicate: `field operator value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated path into the evaluation context.
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// A condition without a comparison value, for `IS_EMPTY`/`IS_NOT_EMPTY`.
    pub fn unary(field: impl Into<String>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
        }
    }
}

/// An `AND`/`OR` combinator over an ordered list of children.
///
/// `Clone`, `PartialEq`, `Debug` and `Drop` walk the tree with an explicit
/// stack, so nesting depth is bounded only by memory.
#[derive(Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: LogicalOperator,
    pub conditions: Vec<ConditionNode>,
}

/// A group whose children are being copied.
struct CloneFrame<'n> {
    source: &'n ConditionGroup,
    next: usize,
    children: Vec<ConditionNode>,
}

impl<'n> CloneFrame<'n> {
    fn new(source: &'n ConditionGroup) -> Self {
        Self {
            source,
            next: 0,
            children: Vec::with_capacity(source.conditions.len()),
        }
    }

    fn finish(self) -> ConditionGroup {
        ConditionGroup {
            operator: self.source.operator,
            conditions: self.children,
        }
    }
}

impl Clone for ConditionGroup {
    fn clone(&self) -> Self {
        let mut current = CloneFrame::new(self);
        let mut parents: Vec<CloneFrame<'_>> = Vec::new();
        loop {
            let source = current.source;
            if let Some(child) = source.conditions.get(current.next) {
                current.next += 1;
                match child {
                    ConditionNode::Condition(condition) => current
                        .children
                        .push(ConditionNode::Condition(condition.clone())),
                    ConditionNode::Group(group) => {
                        parents.push(std::mem::replace(&mut current, CloneFrame::new(group)));
                    }
                }
                continue;
            }

            let group = current.finish();
            match parents.pop() {
                Some(parent) => {
                    current = parent;
                    current.children.push(ConditionNode::Group(group));
                }
                None => return group,
            }
        }
    }
}

impl PartialEq for ConditionGroup {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.operator != right.operator {
                return false;
            }
            if left.conditions.len() != right.conditions.len() {
                return false;
            }
            for pair in left.conditions.iter().zip(&right.conditions) {
                match pair {
                    (ConditionNode::Condition(a), ConditionNode::Condition(b)) => {
                        if a != b {
                            return false;
                        }
                    }
                    (ConditionNode::Group(a), ConditionNode::Group(b)) => pending.push((a, b)),
                    _ => return false,
                }
            }
        }
        true
    }
}

enum DebugPiece<'n> {
    Group(&'n ConditionGroup),
    Condition(&'n Condition),
    Text(&'static str),
}

impl fmt::Debug for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![DebugPiece::Group(self)];
        while let Some(piece) = stack.pop() {
            let group = match piece {
                DebugPiece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                DebugPiece::Condition(condition) => {
                    write!(f, "Condition({:?})", condition)?;
                    continue;
                }
                DebugPiece::Group(group) => group,
            };
            write!(f, "ConditionGroup {{ operator: {:?}, conditions: [", group.operator)?;
            stack.push(DebugPiece::Text("] }"));
            for (i, child) in group.conditions.iter().enumerate().rev() {
                match child {
                    ConditionNode::Group(nested) => {
                        stack.push(DebugPiece::Text(")"));
                        stack.push(DebugPiece::Group(nested));
                        stack.push(DebugPiece::Text("Group("));
                    }
                    ConditionNode::Condition(condition) => {
                        stack.push(DebugPiece::Condition(condition));
                    }
                }
                if i > 0 {
                    stack.push(DebugPiece::Text(", "));
                }
            }
        }
        Ok(())
    }
}

// Flattens nested groups before dropping so deep trees do not recurse.
impl Drop for ConditionGroup {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.conditions);
        while let Some(node) = pending.pop() {
            if let ConditionNode::Group(mut group) = node {
                pending.append(&mut group.conditions);
            }
        }
    }
}

/// Either a leaf condition or a nested group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Condition(Condition),
}

impl ConditionNode {
    pub fn and(children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group(ConditionGroup {
            operator: LogicalOperator::And,
            conditions: children,
        })
    }

    pub fn or(children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group(ConditionGroup {
            operator: LogicalOperator::Or,
            conditions: children,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DefinitionParseError> {
        serde_json::from_str(json).map_err(|e| DefinitionParseError::Json(e.to_string()))
    }

    /// Number of leaf conditions anywhere below this node.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ConditionNode::Condition(_) => count += 1,
                ConditionNode::Group(group) => stack.extend(group.conditions.iter()),
            }
        }
        count
    }

    /// Returns true if this node or any nested group has no children.
    pub fn has_empty_group(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let ConditionNode::Group(group) = node {
                if group.conditions.is_empty() {
                    return true;
                }
                stack.extend(group.conditions.iter());
            }
        }
        false
    }
}

impl From<Condition> for ConditionNode {
    fn from(condition: Condition) -> Self {
        ConditionNode::Condition(condition)
    }
}
