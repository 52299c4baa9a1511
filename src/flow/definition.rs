use crate::condition::ConditionNode;
use crate::error::DefinitionParseError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The status tag carried by a stage and by an approval instance.
///
/// The four built-in tags cover the common lifecycle; anything else is a
/// domain-specific intermediate status that behaves like `in_process`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    InProcess,
    Approved,
    Reject,
    End,
    Custom(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::InProcess => "in_process",
            Status::Approved => "approved",
            Status::Reject => "reject",
            Status::End => "end",
            Status::Custom(s) => s,
        }
    }

    /// Terminal statuses close an approval for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Approved | Status::Reject | Status::End)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "in_process" => Status::InProcess,
            "approved" => Status::Approved,
            "reject" => Status::Reject,
            "end" => Status::End,
            _ => Status::Custom(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Status::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is expected to act on a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Actor {
    Role(String),
    User(String),
}

/// A directed edge out of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Stage to move into. `None` terminates directly into `to`.
    #[serde(default)]
    pub target_stage_id: Option<String>,
    /// Resulting status once this transition fires.
    pub to: Status,
    #[serde(default)]
    pub label: Option<String>,
    /// Every group must pass for the transition to be eligible.
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,
    #[serde(default)]
    pub is_default: bool,
}

impl Transition {
    pub fn to(status: impl Into<Status>) -> Self {
        Self {
            target_stage_id: None,
            to: status.into(),
            label: None,
            conditions: Vec::new(),
            is_default: false,
        }
    }

    pub fn with_target_stage(mut self, stage_id: impl Into<String>) -> Self {
        self.target_stage_id = Some(stage_id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_condition(mut self, node: ConditionNode) -> Self {
        self.conditions.push(node);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// True when `token` names this transition's destination (stage id or status),
    /// or, when `include_label` is set, its label.
    pub fn answers_to(&self, token: &str, include_label: bool) -> bool {
        self.target_stage_id.as_deref() == Some(token)
            || self.to.as_str() == token
            || (include_label && self.label.as_deref() == Some(token))
    }
}

/// One node of a flow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actor: Option<Actor>,
    pub status: Status,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// How many times this stage may be re-entered through a return loop.
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl Stage {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: impl Into<Status>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            description: name.clone(),
            name,
            actor: None,
            status: status.into(),
            transitions: Vec::new(),
            max_iterations: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn default_transition(&self) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.is_default)
    }
}

/// The complete, declarative description of how an approval type moves from
/// submission to resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Semantic version string, `major.minor.patch`.
    pub version: String,
    pub stages: Vec<Stage>,
}

impl FlowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_string(),
            stages,
        }
    }

    /// Parses a definition from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, DefinitionParseError> {
        serde_json::from_str(json).map_err(|e| DefinitionParseError::Json(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DefinitionParseError> {
        serde_json::to_string_pretty(self).map_err(|e| DefinitionParseError::Json(e.to_string()))
    }

    /// The entry stage: new approvals start here.
    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    /// Status values double as stage keys in legacy lookups.
    pub fn stage_by_status(&self, status: &Status) -> Option<&Stage> {
        self.stages.iter().find(|s| &s.status == status)
    }

    /// Builds a `status -> stage` index. Later duplicates never overwrite earlier entries.
    pub fn status_index(&self) -> AHashMap<&str, &Stage> {
        let mut index = AHashMap::with_capacity(self.stages.len());
        for stage in &self.stages {
            index.entry(stage.status.as_str()).or_insert(stage);
        }
        index
    }
}
