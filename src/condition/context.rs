use crate::approval::ApprovalInstance;
use crate::error::DefinitionParseError;
use crate::flow::Status;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const RESOURCE: &str = "resource";
const REQUESTER: &str = "requester";
const CURRENT_APPROVER: &str = "currentApprover";
const WORKFLOW: &str = "workflow";

const ROOTS: [&str; 4] = [RESOURCE, REQUESTER, CURRENT_APPROVER, WORKFLOW];

/// Workflow metadata exposed to conditions under `workflow.*`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMeta {
    pub iteration: u32,
    pub current_stage_id: Option<String>,
    pub previous_stage_id: Option<String>,
    pub status: Option<Status>,
}

/// The read-only bundle a condition is evaluated against.
///
/// Paths starting with `resource`, `requester`, `currentApprover` or `workflow`
/// are resolved from that root; any other path is resolved inside `resource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    root: Map<String, Value>,
}

impl EvaluationContext {
    pub fn new(resource: Value) -> Self {
        let mut root = Map::new();
        root.insert(RESOURCE.to_string(), resource);
        Self { root }
    }

    /// Builds a context for `approval`, filling `workflow` from its current state.
    pub fn for_approval(approval: &ApprovalInstance, resource: Value) -> Self {
        Self::new(resource).with_workflow(approval.workflow_meta())
    }

    pub fn with_requester(mut self, requester: Value) -> Self {
        self.root.insert(REQUESTER.to_string(), requester);
        self
    }

    pub fn with_current_approver(mut self, approver: Value) -> Self {
        self.root.insert(CURRENT_APPROVER.to_string(), approver);
        self
    }

    pub fn with_workflow(mut self, meta: WorkflowMeta) -> Self {
        // A plain struct of strings and integers always serializes.
        let value = serde_json::to_value(meta).unwrap_or(Value::Null);
        self.root.insert(WORKFLOW.to_string(), value);
        self
    }

    /// Parses a context document. A document without any of the known roots is
    /// taken to be the resource payload itself.
    pub fn from_json(json: &str) -> Result<Self, DefinitionParseError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| DefinitionParseError::Json(e.to_string()))?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) if ROOTS.iter().any(|r| map.contains_key(*r)) => Self { root: map },
            other => Self::new(other),
        }
    }

    /// Walks a dot-separated path. `None` means the field is unresolved.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        let mut segments = path.split('.');
        let first = segments.next()?;
        let start = if ROOTS.contains(&first) {
            self.root.get(first)?
        } else {
            step(self.root.get(RESOURCE)?, first)?
        };
        segments.try_fold(start, step)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

fn step<'v>(current: &'v Value, segment: &str) -> Option<&'v Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
