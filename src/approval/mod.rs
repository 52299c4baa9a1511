use crate::condition::WorkflowMeta;
use crate::error::ApprovalError;
use crate::flow::{FlowDefinition, Status, VersionedFlow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod machine;

/// One committed action in an approval's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// The stage the action was taken in.
    pub stage_id: String,
    /// The stage the approval moved into, if any.
    pub next_stage_id: Option<String>,
    pub actor: String,
    /// The transition's label, or the resulting status when it has none.
    pub decision: String,
    pub status: Status,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A live request progressing through a bound flow definition.
///
/// Only [`ApprovalInstance::apply_transition`] and the helpers built on it move
/// an instance forward. Once `status` is terminal the instance never changes again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalInstance {
    pub id: String,
    pub flow_id: String,
    /// The flow version that was active when the approval was created.
    pub flow_version_id: Option<String>,
    pub current_stage_id: Option<String>,
    pub status: Status,
    pub iteration: u32,
    pub history: Vec<HistoryRecord>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ApprovalInstance {
    /// Creates an approval in the first stage of `definition`.
    pub fn new(id: impl Into<String>, definition: &FlowDefinition) -> Result<Self, ApprovalError> {
        Self::new_at(id, definition, None, Utc::now())
    }

    /// Creates an approval bound to the active version of `flow`.
    pub fn start(id: impl Into<String>, flow: &VersionedFlow) -> Result<Self, ApprovalError> {
        Self::new_at(
            id,
            &flow.definition,
            flow.active_version_id.clone(),
            Utc::now(),
        )
    }

    pub fn new_at(
        id: impl Into<String>,
        definition: &FlowDefinition,
        flow_version_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        let entry = definition
            .first_stage()
            .ok_or_else(|| ApprovalError::EmptyFlow(definition.id.clone()))?;
        Ok(Self {
            id: id.into(),
            flow_id: definition.id.clone(),
            flow_version_id,
            current_stage_id: Some(entry.id.clone()),
            status: Status::InProcess,
            iteration: 0,
            history: Vec::new(),
            created_at,
            completed_at: None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// How many times `stage_id` has been entered, counting the initial stage.
    pub fn visits(&self, stage_id: &str) -> u32 {
        let entry = self
            .history
            .first()
            .map(|r| r.stage_id.as_str())
            .or(self.current_stage_id.as_deref());
        let initial = u32::from(entry == Some(stage_id));
        let returns = self
            .history
            .iter()
            .filter(|r| r.next_stage_id.as_deref() == Some(stage_id))
            .count() as u32;
        initial + returns
    }

    pub fn previous_stage_id(&self) -> Option<&str> {
        self.history.last().map(|r| r.stage_id.as_str())
    }

    /// Workflow metadata as exposed to conditions under `workflow.*`.
    pub fn workflow_meta(&self) -> WorkflowMeta {
        WorkflowMeta {
            iteration: self.iteration,
            current_stage_id: self.current_stage_id.clone(),
            previous_stage_id: self.previous_stage_id().map(str::to_string),
            status: Some(self.status.clone()),
        }
    }
}
